//! Test fixtures

use serde_json::{json, Value};

use crate::auth::{Session, UserProfile, UserRole};

use super::builders::{ProfileBuilder, SessionBuilder};

/// Creates an active profile with the given role
pub fn make_profile(id: &str, role: UserRole) -> UserProfile {
    ProfileBuilder::new().id(id).role(role).build()
}

/// Creates a doctor's session
pub fn make_session(access_token: &str, refresh_token: Option<&str>) -> Session {
    SessionBuilder::new()
        .access_token(access_token)
        .refresh_token(refresh_token)
        .build()
}

/// Profile body as the backend's `me` endpoint returns it
pub fn profile_json(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{role}@example.org"),
        "role": role,
        "first_name": "Test",
        "last_name": "User",
        "organization_id": "org_1",
        "branch_id": null,
        "is_active": true
    })
}
