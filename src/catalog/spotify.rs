//! HTTP client for the external album catalog (Spotify web API).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::models::{AlbumDetail, AlbumSummary, WireAlbum, WireSearchResponse};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Refresh the cached token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

/// Read access to the external album catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<AlbumSummary>>;

    /// Returns Ok(None) when the catalog has no album with this id.
    async fn get_album(&self, id: &str) -> Result<Option<AlbumDetail>>;
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Catalog client speaking the Spotify web API with a client-credentials
/// token cached across requests.
pub struct SpotifyClient {
    client: reqwest::Client,
    api_base: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String, timeout_sec: u64) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            DEFAULT_API_BASE.to_string(),
            DEFAULT_TOKEN_URL.to_string(),
            timeout_sec,
        )
    }

    /// Endpoint override used by tests to point at a stub upstream.
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        api_base: String,
        token_url: String,
        timeout_sec: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url,
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, fetching a fresh one from the token
    /// endpoint when the cached one is absent or about to expire.
    async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        debug!("Fetching fresh catalog access token");
        let basic = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(&self.token_url)
            .header(header::AUTHORIZATION, format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to reach catalog token endpoint")?;

        if !response.status().is_success() {
            bail!(
                "Catalog token request failed with status {}",
                response.status()
            );
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse catalog token response")?;

        let lifetime = token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn search_albums(&self, query: &str, limit: usize) -> Result<Vec<AlbumSummary>> {
        let token = self.bearer_token().await?;
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "album"), ("limit", limit.as_str())])
            .send()
            .await
            .context("Failed to reach catalog search endpoint")?;

        if !response.status().is_success() {
            bail!("Catalog search failed with status {}", response.status());
        }

        let parsed: WireSearchResponse = response
            .json()
            .await
            .context("Failed to parse catalog search response")?;

        Ok(parsed
            .albums
            .items
            .iter()
            .map(WireAlbum::to_summary)
            .collect())
    }

    async fn get_album(&self, id: &str) -> Result<Option<AlbumDetail>> {
        let token = self.bearer_token().await?;
        let response = self
            .client
            .get(format!("{}/albums/{}", self.api_base, id))
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch album {} from catalog", id))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!(
                "Catalog album lookup for {} failed with status {}",
                id,
                response.status()
            );
        }

        let wire: WireAlbum = response
            .json()
            .await
            .context("Failed to parse catalog album response")?;
        Ok(Some(wire.into_detail()))
    }
}
