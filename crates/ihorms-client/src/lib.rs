//! Session-aware client for the IHORMS API
//!
//! [`ApiClient`] attaches the signed-in user's credential to every call and
//! transparently refreshes it once on a 401. [`SessionStore`] owns the
//! session, and [`RouteGuard`] answers access checks from the cached profile.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;

#[cfg(test)]
mod testutil;

pub use api::{ApiClient, ApiError, RequestDescriptor};
pub use auth::{
    Credentials, FileSessionStore, LoginEncoding, MemorySessionStore, Session, SessionEvent,
    SessionState, SessionStorage, SessionStore, UserProfile, UserRole,
};
pub use config::{ClientConfig, ConfigManager};
pub use guard::{GuardDecision, RouteGuard};
pub use reqwest::Method;
