//! Owned session state shared by the API client and the route guard
//!
//! Reads are synchronous and never touch the network or the disk. Writes go
//! to the persistent backend first and then swap the in-memory copy, so the
//! cache never holds a credential the backend does not.

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

use super::store::{Session, SessionStorage, StoreError};
use super::types::UserProfile;

/// Externally observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Session change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    LoggedOut,
    /// The credential was rejected and could not be refreshed. The application
    /// should send the user back to the login entry point.
    Expired,
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
    change_tx: watch::Sender<Option<SessionEvent>>,
    change_rx: watch::Receiver<Option<SessionEvent>>,
}

impl SessionStore {
    /// Creates a store and restores any session persisted by a previous run
    ///
    /// An unreadable stored session is logged and treated as absent.
    pub async fn init(storage: Arc<dyn SessionStorage>) -> Arc<Self> {
        if !storage.has_session().await {
            tracing::debug!("No stored session");
            return Arc::new(Self::with_state(storage, None));
        }

        let restored = match storage.load().await {
            Ok(session) if session.is_valid() => {
                tracing::info!(
                    "Restored session for {} ({})",
                    session.user.email,
                    session.user.role
                );
                Some(session)
            }
            Ok(_) => {
                tracing::warn!("Stored session has no access token, ignoring it");
                None
            }
            Err(StoreError::NoSession) => {
                tracing::debug!("No stored session");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to restore session: {}", e);
                None
            }
        };

        Arc::new(Self::with_state(storage, restored))
    }

    /// Creates an unauthenticated store without reading the backend
    pub fn empty(storage: Arc<dyn SessionStorage>) -> Arc<Self> {
        Arc::new(Self::with_state(storage, None))
    }

    fn with_state(storage: Arc<dyn SessionStorage>, session: Option<Session>) -> Self {
        let (change_tx, change_rx) = watch::channel(None);
        Self {
            storage,
            current: RwLock::new(session),
            change_tx,
            change_rx,
        }
    }

    /// Returns a receiver for session change notifications
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionEvent>> {
        self.change_rx.clone()
    }

    fn notify(&self, event: SessionEvent) {
        let _ = self.change_tx.send(Some(event));
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Session>) -> T) -> T {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    fn swap(&self, session: Option<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Copy of the whole session
    pub fn session(&self) -> Option<Session> {
        self.read(|s| s.cloned())
    }

    /// Cached profile of the signed-in user
    pub fn current_user(&self) -> Option<UserProfile> {
        self.read(|s| s.map(|s| s.user.clone()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|s| s.map(|s| s.access_token.clone()))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(|s| s.and_then(|s| s.refresh_token.clone()))
    }

    pub fn state(&self) -> SessionState {
        if self.read(|s| s.is_some()) {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Installs a freshly created session
    pub async fn establish(&self, session: Session) -> Result<(), StoreError> {
        self.storage.save(&session).await?;
        self.swap(Some(session));
        self.notify(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Replaces the access credential, and the refresh credential when the
    /// backend rotated it
    ///
    /// The previous access token is dropped in the same swap that installs
    /// the new one.
    pub async fn replace_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), StoreError> {
        let mut session = self.session().ok_or(StoreError::NoSession)?;
        session.access_token = access_token;
        if refresh_token.is_some() {
            session.refresh_token = refresh_token;
        }

        self.storage.save(&session).await?;
        self.swap(Some(session));
        self.notify(SessionEvent::Refreshed);
        Ok(())
    }

    /// Replaces the cached profile, keeping the credentials
    pub async fn update_user(&self, user: UserProfile) -> Result<(), StoreError> {
        let mut session = self.session().ok_or(StoreError::NoSession)?;
        session.user = user;

        self.storage.save(&session).await?;
        self.swap(Some(session));
        Ok(())
    }

    /// Drops the session
    ///
    /// The in-memory session is cleared even when the backend fails to
    /// delete its copy; that failure is still returned.
    pub async fn clear(&self, reason: SessionEvent) -> Result<(), StoreError> {
        let result = self.storage.delete().await;
        self.swap(None);
        self.notify(reason);
        result.map_err(StoreError::from)
    }
}
