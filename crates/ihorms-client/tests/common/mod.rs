//! Common test utilities for integration tests
#![allow(dead_code)]

use ihorms_client::{ApiClient, ClientConfig, MemorySessionStore, SessionStorage, SessionStore};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Profile body as the backend's `me` endpoint returns it
pub fn profile_body(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{role}@example.org"),
        "role": role,
        "first_name": "Test",
        "last_name": "User",
        "is_active": true
    })
}

/// Client pointed at `server` with an in-memory session
pub fn memory_client(server: &MockServer) -> (ApiClient, Arc<MemorySessionStore>) {
    let storage = Arc::new(MemorySessionStore::new());
    let session = SessionStore::empty(storage.clone());
    (client_for(server, session), storage)
}

/// Client pointed at `server` over an existing session store
pub fn client_for(server: &MockServer, session: Arc<SessionStore>) -> ApiClient {
    ApiClient::new(ClientConfig::with_base_url(server.uri()), session)
}

/// Mounts a login exchange that issues `access` and `refresh`
pub async fn mount_login(server: &MockServer, access: &str, refresh: Option<&str>) {
    let mut body = json!({ "access_token": access, "token_type": "bearer" });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts the profile endpoint for a bearer token
pub async fn mount_me(server: &MockServer, access: &str, id: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(id, role)))
        .mount(server)
        .await;
}

/// Whether the storage backend holds a session
pub async fn has_stored_session(storage: &dyn SessionStorage) -> bool {
    storage.has_session().await
}
