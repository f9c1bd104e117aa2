use reqwest::Method;
use serde_json::Value;

use super::http::HttpBody;

/// One API call, described relative to the API prefix
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<HttpBody>,
    pub headers: Vec<(String, String)>,
    /// Whether a 401 may trigger the refresh-and-retry exchange
    pub refresh_on_unauthorized: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            refresh_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sends `body` as JSON
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(HttpBody::Json(body));
        self
    }

    /// Sends `pairs` form-url-encoded
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(HttpBody::Form(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ));
        self
    }

    /// Appends a percent-encoded query parameter
    pub fn query(mut self, name: &str, value: impl AsRef<str>) -> Self {
        let separator = if self.path.contains('?') { '&' } else { '?' };
        self.path = format!(
            "{}{}{}={}",
            self.path,
            separator,
            urlencoding::encode(name),
            urlencoding::encode(value.as_ref())
        );
        self
    }

    /// Adds an extra header. Overrides the client's defaults except `Authorization`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns a 401 to the caller as-is instead of refreshing
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }
}
