use serde_json::Value;

use crate::auth::StoreError;

/// Errors surfaced to callers of the API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Network error: {0:#}")]
    Network(#[source] anyhow::Error),

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Parsed error payload, when the backend sent JSON
        details: Option<Value>,
    },

    /// The credential was rejected and could not be refreshed. The session
    /// has been cleared.
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Builds an `Http` error from a failed response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let details: Option<Value> = serde_json::from_str(body).ok();
        let message = details
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| format!("Request failed with status {status}"));

        ApiError::Http {
            status,
            message,
            details,
        }
    }

    /// HTTP status, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthenticated => Some(401),
            _ => None,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }

    /// True for the 400/422 replies forms render as field validation errors
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Http { status: 400 | 422, .. })
    }

    /// Human-readable message for display
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Unauthenticated => "Your session has expired. Please sign in again.".into(),
            ApiError::Network(_) => "Unable to reach the server.".into(),
            other => other.to_string(),
        }
    }
}

/// Pulls a message out of the backend's error payload
///
/// Understands `{"detail": "..."}`, the validation form
/// `{"detail": [{"msg": "..."}, ...]}`, `{"message": "..."}` and `{"error": "..."}`.
fn extract_message(payload: &Value) -> Option<String> {
    match payload.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }

    ["message", "error"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
