//! Typed API client and session state.
//!
//! This is the application-state side of the system: tokens live in an
//! explicit state object injected into the client (hydrated from
//! persisted credentials on startup, cleared on logout), every call
//! attaches the current access token, and a 401 triggers exactly one
//! refresh-and-retry. Concurrent 401s are funneled through a single
//! in-flight refresh: callers record the token generation they sent and
//! only the first one holding a stale generation actually hits
//! `/refresh`; the rest just retry with the replacement token.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::AlbumSummary;
use crate::library::{AlbumStatus, StatusKind};
use crate::user::{Account, TokenPair};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("authentication failed")]
    Unauthorized,
    #[error("request failed with status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AverageRating {
    pub album_id: String,
    pub average_rating: Option<f64>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: RwLock<Option<TokenPair>>,
    /// Bumped on every successful refresh or (re)hydration; callers use
    /// it to tell whether the token they sent is already stale.
    generation: AtomicU64,
    refresh_lock: tokio::sync::Mutex<()>,
    refresh_calls: AtomicUsize,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: RwLock::new(None),
            generation: AtomicU64::new(0),
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    /// Installs a persisted token pair, e.g. on application startup.
    pub fn hydrate(&self, tokens: TokenPair) {
        let mut guard = self.tokens.write().unwrap();
        *guard = Some(tokens);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Drops all credentials; subsequent calls fail with NotLoggedIn.
    pub fn clear(&self) {
        let mut guard = self.tokens.write().unwrap();
        *guard = None;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens.read().unwrap().is_some()
    }

    /// The current token pair, e.g. for persisting across restarts.
    pub fn tokens(&self) -> Option<TokenPair> {
        self.tokens.read().unwrap().clone()
    }

    /// How many times `/refresh` has actually been called.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::Relaxed)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the access token together with the generation it belongs
    /// to. Reading both under the lock keeps them consistent.
    fn current_access_token(&self) -> Result<(String, u64), ClientError> {
        let guard = self.tokens.read().unwrap();
        let pair = guard.as_ref().ok_or(ClientError::NotLoggedIn)?;
        let generation = self.generation.load(Ordering::Acquire);
        Ok((pair.access_token.clone(), generation))
    }

    async fn send_authenticated(
        &self,
        method: Method,
        path: &str,
        body: &Option<Value>,
    ) -> Result<(reqwest::Response, u64), ClientError> {
        let (token, generation) = self.current_access_token()?;
        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok((request.send().await?, generation))
    }

    /// Refreshes the access token unless another caller already did it
    /// since `seen_generation` was read.
    async fn refresh_if_stale(&self, seen_generation: u64) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;
        if self.generation.load(Ordering::Acquire) != seen_generation {
            return Ok(());
        }

        let refresh_token = {
            let guard = self.tokens.read().unwrap();
            guard
                .as_ref()
                .ok_or(ClientError::NotLoggedIn)?
                .refresh_token
                .clone()
        };

        let response = self
            .http
            .post(self.url("/refresh"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            // The refresh token itself is no good anymore
            self.clear();
            return Err(ClientError::Unauthorized);
        }

        let body: AccessTokenResponse = response.json().await?;
        {
            let mut guard = self.tokens.write().unwrap();
            if let Some(pair) = guard.as_mut() {
                pair.access_token = body.access_token;
            }
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.refresh_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Sends an authenticated request with the single 401-refresh-retry
    /// policy. All other failures are terminal for this call.
    async fn request_response(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let (response, generation) = self
            .send_authenticated(method.clone(), path, &body)
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        self.refresh_if_stale(generation).await?;
        let (retried, _) = self.send_authenticated(method, path, &body).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            self.clear();
            return Err(ClientError::Unauthorized);
        }
        Ok(retried)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let response = self.request_response(method, path, body).await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), ClientError> {
        let response = self.request_response(method, path, body).await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(())
    }

    // ---- unauthenticated entry points ----

    /// Registers a new account. The account still needs verification
    /// before it can log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/register"))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
                "confirm_password": confirm_password,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(())
    }

    /// Logs in and installs the returned token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        let pair: TokenPair = response.json().await?;
        self.hydrate(pair);
        Ok(())
    }

    // ---- authenticated operations ----

    pub async fn me(&self) -> Result<Account, ClientError> {
        self.request_json(Method::GET, "/me", None).await
    }

    pub async fn list_statuses(&self) -> Result<Vec<AlbumStatus>, ClientError> {
        self.request_json(Method::GET, "/statuses", None).await
    }

    pub async fn set_status(
        &self,
        album_id: &str,
        status: StatusKind,
        is_favorite: bool,
    ) -> Result<AlbumStatus, ClientError> {
        self.request_json(
            Method::POST,
            "/statuses",
            Some(json!({
                "album_id": album_id,
                "status": status,
                "is_favorite": is_favorite,
            })),
        )
        .await
    }

    pub async fn update_status(
        &self,
        status_id: usize,
        status: Option<StatusKind>,
        is_favorite: Option<bool>,
    ) -> Result<AlbumStatus, ClientError> {
        self.request_json(
            Method::PATCH,
            &format!("/statuses/{}", status_id),
            Some(json!({ "status": status, "is_favorite": is_favorite })),
        )
        .await
    }

    pub async fn remove_status(&self, status_id: usize) -> Result<(), ClientError> {
        self.request_no_content(Method::DELETE, &format!("/statuses/{}", status_id), None)
            .await
    }

    pub async fn toggle_favorite(&self, album_id: &str) -> Result<AlbumStatus, ClientError> {
        self.request_json(
            Method::POST,
            &format!("/albums/{}/favorite", album_id),
            None,
        )
        .await
    }

    pub async fn follow(&self, user_id: usize) -> Result<(), ClientError> {
        self.request_no_content(Method::POST, &format!("/users/{}/follow", user_id), None)
            .await
    }

    pub async fn unfollow(&self, user_id: usize) -> Result<(), ClientError> {
        self.request_no_content(Method::DELETE, &format!("/users/{}/follow", user_id), None)
            .await
    }

    pub async fn create_review(
        &self,
        album_id: &str,
        rating: Option<f64>,
        content: &str,
    ) -> Result<(), ClientError> {
        self.request_no_content(
            Method::POST,
            "/reviews",
            Some(json!({
                "album_id": album_id,
                "rating": rating,
                "content": content,
            })),
        )
        .await
    }

    pub async fn average_rating(&self, album_id: &str) -> Result<AverageRating, ClientError> {
        self.request_json(
            Method::GET,
            &format!("/albums/{}/average-rating", album_id),
            None,
        )
        .await
    }

    pub async fn search_albums(&self, query: &str) -> Result<Vec<AlbumSummary>, ClientError> {
        self.request_json(
            Method::GET,
            &format!("/spotify/search?q={}", urlencoding::encode(query)),
            None,
        )
        .await
    }
}

/// The logged-in user and their status list, mirroring what the UI
/// renders. Hydrated from the API after login or startup and cleared on
/// logout.
#[derive(Default)]
pub struct SessionContext {
    pub user: Option<Account>,
    pub statuses: Vec<AlbumStatus>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn hydrate(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        self.user = Some(api.me().await?);
        self.statuses = api.list_statuses().await?;
        Ok(())
    }

    pub fn clear(&mut self, api: &ApiClient) {
        api.clear();
        self.user = None;
        self.statuses.clear();
    }
}
