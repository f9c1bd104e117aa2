//! Test data builders

use crate::auth::{Session, UserProfile, UserRole};

/// Builder for test profiles with sensible defaults
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    profile: UserProfile,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self {
            profile: UserProfile {
                id: "user_1".to_string(),
                email: "user@example.org".to_string(),
                role: UserRole::Doctor,
                full_name: Some("Test User".to_string()),
                organization_id: Some("org_1".to_string()),
                branch_id: Some("branch_1".to_string()),
                is_active: Some(true),
            },
        }
    }
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.profile.id = id.into();
        self
    }

    pub fn role(mut self, role: UserRole) -> Self {
        self.profile.role = role;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.profile.is_active = Some(false);
        self
    }

    pub fn build(self) -> UserProfile {
        self.profile
    }
}

/// Builder for test sessions
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    access_token: String,
    refresh_token: Option<String>,
    user: UserProfile,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            access_token: "access_token".to_string(),
            refresh_token: Some("refresh_token".to_string()),
            user: ProfileBuilder::new().build(),
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    pub fn refresh_token(mut self, token: Option<&str>) -> Self {
        self.refresh_token = token.map(str::to_string);
        self
    }

    pub fn user(mut self, user: UserProfile) -> Self {
        self.user = user;
        self
    }

    pub fn build(self) -> Session {
        Session::new(self.access_token, self.refresh_token, self.user)
    }
}
