//! Role-based access checks for application screens

use std::sync::Arc;

use crate::auth::{SessionStore, UserRole};

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// No session; send the user to the login entry point
    RedirectToLogin,
    /// Signed in, but this screen is not for them
    Forbidden,
}

impl GuardDecision {
    pub fn is_allowed(self) -> bool {
        self == GuardDecision::Allow
    }
}

/// Answers access checks from the cached session. Never touches the network.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Checks the signed-in user against the roles a screen admits
    ///
    /// An empty `allowed_roles` admits any authenticated user. A deactivated
    /// account is always forbidden.
    pub fn check(&self, allowed_roles: &[UserRole]) -> GuardDecision {
        let Some(user) = self.session.current_user() else {
            return GuardDecision::RedirectToLogin;
        };

        if user.is_active == Some(false) {
            tracing::debug!("Denying inactive account {}", user.email);
            return GuardDecision::Forbidden;
        }

        if allowed_roles.is_empty() || allowed_roles.contains(&user.role) {
            GuardDecision::Allow
        } else {
            tracing::debug!("Role {} not admitted", user.role);
            GuardDecision::Forbidden
        }
    }
}
