mod session;
pub mod store;
mod types;

pub use session::{SessionEvent, SessionState, SessionStore};
pub use store::{FileSessionStore, MemorySessionStore, Session, SessionStorage, StoreError};
pub use types::{Credentials, LoginEncoding, TokenResponse, UserProfile, UserRole};
