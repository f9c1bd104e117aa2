//! HTTP transport abstraction
//!
//! The API client talks to the network only through [`HttpClient`], so tests
//! can script responses without a server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

/// Request body as it goes on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A fully resolved request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<HttpBody>,
}

/// Trait for sending HTTP requests
///
/// `Err` means no response was received at all. Any HTTP status, including
/// errors, comes back as `Ok(HttpResponse)`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Response from an HTTP request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Returns true if status is in 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if status is 401
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Production HTTP client using reqwest
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new reqwest-based HTTP client
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .inner
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match request.body {
            Some(HttpBody::Json(value)) => builder.json(&value),
            Some(HttpBody::Form(pairs)) => builder.form(&pairs),
            None => builder,
        };

        let response = builder.send().await.context("Failed to send request")?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(HttpResponse { status, body })
    }
}
