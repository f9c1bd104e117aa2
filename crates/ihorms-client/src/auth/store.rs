use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use super::types::UserProfile;

const SERVICE_NAME: &str = "ihorms";
const KEYRING_USER: &str = "session";
const SESSION_FILE: &str = "session.json";

/// Persisted authentication state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: String, refresh_token: Option<String>, user: UserProfile) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
            issued_at: Utc::now(),
        }
    }

    /// Checks the session carries a usable access token
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No session stored")]
    NoSession,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Backend that persists the session between runs
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Saves the session, replacing any previous one
    async fn save(&self, session: &Session) -> Result<()>;

    /// Loads the stored session
    async fn load(&self) -> Result<Session, StoreError>;

    /// Deletes the stored session
    async fn delete(&self) -> Result<()>;

    /// Checks if a session is stored
    async fn has_session(&self) -> bool;
}

/// File-backed session storage with the system keyring as a secondary copy
///
/// The JSON file is authoritative. Keyring errors are ignored since many
/// headless environments have no secret service.
pub struct FileSessionStore {
    keyring_entry: Option<keyring::Entry>,
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store under the per-user config directory
    pub fn new() -> Result<Self> {
        let config_dir = crate::config::ConfigManager::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;

        Ok(Self {
            keyring_entry: keyring::Entry::new(SERVICE_NAME, KEYRING_USER).ok(),
            path: config_dir.join(SESSION_FILE),
        })
    }

    /// Creates a file-only store at a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            keyring_entry: None,
            path,
        }
    }

    fn parse(data: &str) -> Result<Session, StoreError> {
        serde_json::from_str(data).map_err(|e| StoreError::Storage(e.into()))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(session).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        std::fs::write(&self.path, &data).context("Failed to write session file")?;

        if let Some(ref entry) = self.keyring_entry {
            let _ = entry.set_password(&data);
        }

        Ok(())
    }

    async fn load(&self) -> Result<Session, StoreError> {
        if self.path.exists() {
            let data = std::fs::read_to_string(&self.path)
                .map_err(|e| StoreError::Storage(e.into()))?;
            return Self::parse(&data);
        }

        if let Some(ref entry) = self.keyring_entry {
            if let Ok(data) = entry.get_password() {
                return Self::parse(&data);
            }
        }

        Err(StoreError::NoSession)
    }

    async fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to delete session file")?;
        }

        if let Some(ref entry) = self.keyring_entry {
            let _ = entry.delete_credential();
        }

        Ok(())
    }

    async fn has_session(&self) -> bool {
        if self.path.exists() {
            return true;
        }

        self.keyring_entry
            .as_ref()
            .is_some_and(|entry| entry.get_password().is_ok())
    }
}

/// In-process session storage
///
/// Nothing survives the process. Used by tests and by embedders that keep
/// sessions elsewhere.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Creates a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a memory store with an initial session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Session, StoreError> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StoreError::NoSession)
    }

    async fn delete(&self) -> Result<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    async fn has_session(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
