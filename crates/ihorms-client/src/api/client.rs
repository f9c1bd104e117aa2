use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::ApiError;
use super::http::{HttpBody, HttpClient, HttpRequest, HttpResponse, ReqwestClient};
use super::request::RequestDescriptor;
use crate::auth::{
    Credentials, LoginEncoding, Session, SessionEvent, SessionStore, TokenResponse, UserProfile,
};
use crate::config::ClientConfig;

const JSON_CONTENT: &str = "application/json";
const FORM_CONTENT: &str = "application/x-www-form-urlencoded";

/// Session-aware client for the IHORMS REST API
///
/// Every request carries the current access credential. A 401 triggers one
/// refresh exchange and one retry; if the credential cannot be refreshed the
/// session is cleared and the call resolves to [`ApiError::Unauthenticated`].
///
/// Generic over the HTTP client implementation for testability.
pub struct ApiClient<H: HttpClient = ReqwestClient> {
    http: H,
    config: ClientConfig,
    session: Arc<SessionStore>,
    // Serialises refresh attempts and every session write made by the client
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient<ReqwestClient> {
    /// Creates a client with the default HTTP implementation
    pub fn new(config: ClientConfig, session: Arc<SessionStore>) -> Self {
        Self::with_http_client(config, session, ReqwestClient::new())
    }
}

impl<H: HttpClient + Clone> Clone for ApiClient<H> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            session: self.session.clone(),
            refresh_lock: self.refresh_lock.clone(),
        }
    }
}

impl<H: HttpClient> ApiClient<H> {
    /// Creates a client over a custom HTTP implementation
    pub fn with_http_client(config: ClientConfig, session: Arc<SessionStore>, http: H) -> Self {
        Self {
            http,
            config,
            session,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session store this client reads credentials from
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Cached profile of the signed-in user. Never touches the network.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.current_user()
    }

    fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = HeaderMap::new();

        let content_type = match descriptor.body {
            Some(HttpBody::Form(_)) => FORM_CONTENT,
            _ => JSON_CONTENT,
        };
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        for (name, value) in &descriptor.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            if name == AUTHORIZATION {
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidHeader(AUTHORIZATION.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(HttpRequest {
            method: descriptor.method.clone(),
            url: self.config.endpoint_url(&descriptor.path),
            headers,
            body: descriptor.body.clone(),
        })
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(descriptor, token)?;
        tracing::debug!("{} {}", request.method, request.url);

        let response = self.http.send(request).await.map_err(ApiError::Network)?;
        tracing::debug!("{} {} -> {}", descriptor.method, descriptor.path, response.status);
        Ok(response)
    }

    fn into_result(response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response.body)?)
    }

    fn may_refresh(&self, descriptor: &RequestDescriptor) -> bool {
        descriptor.refresh_on_unauthorized && !self.config.auth.is_exchange(&descriptor.path)
    }

    /// Performs a request and returns the JSON body
    ///
    /// An empty success body yields `Value::Null`.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        let response = self.send(&descriptor, token.as_deref()).await?;

        if !response.is_unauthorized() || !self.may_refresh(&descriptor) {
            return Self::into_result(response);
        }

        tracing::info!(
            "{} {} was rejected, refreshing credential",
            descriptor.method,
            descriptor.path
        );
        let fresh = self.refresh_after_unauthorized(token.as_deref()).await?;

        // Exactly one retry; whatever it returns goes to the caller
        let retry = self.send(&descriptor, Some(&fresh)).await?;
        Self::into_result(retry)
    }

    /// Performs a request and deserializes the JSON body
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let value = self.request(descriptor).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_as(RequestDescriptor::get(path)).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request_as(RequestDescriptor::post(path).json(body)).await
    }

    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request_as(RequestDescriptor::put(path).json(body)).await
    }

    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request_as(RequestDescriptor::patch(path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::delete(path)).await
    }

    /// Fetches a resource under the signed-in user's role, e.g.
    /// `appointments` becomes `/doctor/appointments` for a doctor
    pub async fn get_role_resource<T: DeserializeOwned>(
        &self,
        resource: &str,
    ) -> Result<T, ApiError> {
        let role = self.current_user().ok_or(ApiError::Unauthenticated)?.role;
        let path = format!("/{}/{}", role.api_segment(), resource.trim_start_matches('/'));
        self.get_json(&path).await
    }

    /// Obtains a usable credential after `stale` was rejected
    ///
    /// Single-flight: callers queue on the refresh lock, and a caller that
    /// finds the credential already replaced reuses it instead of refreshing
    /// again.
    async fn refresh_after_unauthorized(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if stale != Some(current.as_str()) {
                tracing::debug!("Credential was refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            tracing::info!("No refresh credential available, ending session");
            self.expire().await;
            return Err(ApiError::Unauthenticated);
        };

        let tokens = match self.exchange_refresh(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("Credential refresh failed: {}", e);
                self.expire().await;
                return Err(ApiError::Unauthenticated);
            }
        };

        let access_token = tokens.access_token.clone();
        self.session
            .replace_tokens(tokens.access_token, tokens.refresh_token)
            .await?;

        tracing::info!("Access credential refreshed");
        Ok(access_token)
    }

    async fn exchange_refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let descriptor = RequestDescriptor::post(self.config.auth.refresh.as_str())
            .json(json!({ "refresh_token": refresh_token }))
            .without_refresh();

        let response = self.send(&descriptor, None).await?;
        let value = Self::into_result(response)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Clears the session after an unrecoverable 401. Caller holds the refresh lock.
    async fn expire(&self) {
        if !self.session.is_authenticated() {
            return;
        }

        if let Err(e) = self.session.clear(SessionEvent::Expired).await {
            tracing::warn!("Failed to delete expired session: {}", e);
        }
    }

    /// Exchanges credentials for a session and fetches the user's profile
    ///
    /// Nothing is persisted unless both the exchange and the profile fetch
    /// succeed.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let login_path = self.config.auth.login.as_str();
        let descriptor = match self.config.login_encoding {
            LoginEncoding::Form => RequestDescriptor::post(login_path).form([
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ]),
            LoginEncoding::Json => RequestDescriptor::post(login_path).json(json!({
                "email": credentials.username,
                "password": credentials.password,
            })),
        }
        .without_refresh();

        let tokens: TokenResponse = match self.request_as(descriptor).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", credentials.username, e);
                return Err(e);
            }
        };

        let me = RequestDescriptor::get(self.config.auth.me.as_str()).without_refresh();
        let response = self.send(&me, Some(&tokens.access_token)).await?;
        let user: UserProfile = serde_json::from_value(Self::into_result(response)?)?;

        let session = Session::new(tokens.access_token, tokens.refresh_token, user);
        {
            let _guard = self.refresh_lock.lock().await;
            self.session.establish(session.clone()).await?;
        }

        tracing::info!("Logged in as {} ({})", session.user.email, session.user.role);
        Ok(session)
    }

    /// Re-fetches the signed-in user's profile and updates the cached copy
    pub async fn refresh_profile(&self) -> Result<UserProfile, ApiError> {
        let user: UserProfile = self
            .request_as(RequestDescriptor::get(self.config.auth.me.as_str()))
            .await?;

        let _guard = self.refresh_lock.lock().await;
        self.session.update_user(user.clone()).await?;
        Ok(user)
    }

    /// Ends the session
    ///
    /// The backend is told on a best-effort basis; its failure is logged and
    /// never returned. The local session is always cleared.
    pub async fn logout(&self) {
        let token = self.session.access_token();
        let descriptor =
            RequestDescriptor::post(self.config.auth.logout.as_str()).without_refresh();

        match self.send(&descriptor, token.as_deref()).await {
            Ok(response) if response.is_success() => {
                tracing::debug!("Backend acknowledged logout");
            }
            Ok(response) => {
                tracing::warn!("Backend logout returned {}", response.status);
            }
            Err(e) => {
                tracing::warn!("Backend logout failed: {}", e);
            }
        }

        let _guard = self.refresh_lock.lock().await;
        if let Err(e) = self.session.clear(SessionEvent::LoggedOut).await {
            tracing::warn!("Failed to delete stored session: {}", e);
        }
        tracing::info!("Logged out");
    }
}
