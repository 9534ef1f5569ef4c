//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with bearer-token management and one method per server
//! endpoint. When API routes or request formats change, update only this
//! file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

/// HTTP test client holding the bearer tokens from the last login
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    access_token: Mutex<Option<String>>,
    refresh_token: Mutex<Option<String>>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows. For most tests, use
    /// `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            access_token: Mutex::new(None),
            refresh_token: Mutex::new(None),
        }
    }

    /// Creates a client pre-authenticated as the seeded test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure
    /// problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client pre-authenticated as an arbitrary seeded user
    pub async fn authenticated_as(base_url: String, username: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(username, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.lock().unwrap().clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.refresh_token.lock().unwrap().clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.lock().unwrap() = token;
    }

    fn bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /register
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Response {
        self.client
            .post(format!("{}/register", self.base_url))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
                "confirm_password": confirm_password,
            }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// GET /verify?token=
    pub async fn verify(&self, token: &str) -> Response {
        self.client
            .get(format!("{}/verify", self.base_url))
            .query(&[("token", token)])
            .send()
            .await
            .expect("Verify request failed")
    }

    /// POST /login (form-encoded). On success the tokens are kept for
    /// subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> Response {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Login request failed");

        if response.status() == reqwest::StatusCode::OK {
            // Read the token pair without consuming the caller's response
            let bytes = response
                .bytes()
                .await
                .expect("Failed to read login body")
                .to_vec();
            let body: serde_json::Value =
                serde_json::from_slice(&bytes).expect("Login body is not JSON");
            *self.access_token.lock().unwrap() = body
                .get("access_token")
                .and_then(|v| v.as_str())
                .map(String::from);
            *self.refresh_token.lock().unwrap() = body
                .get("refresh_token")
                .and_then(|v| v.as_str())
                .map(String::from);
            return http_response_from(bytes);
        }
        response
    }

    /// POST /refresh
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.client
            .post(format!("{}/refresh", self.base_url))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .expect("Refresh request failed")
    }

    /// GET /me
    pub async fn me(&self) -> Response {
        self.bearer(self.client.get(format!("{}/me", self.base_url)))
            .send()
            .await
            .expect("Me request failed")
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /users?q=
    pub async fn search_users(&self, query: &str) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/users", self.base_url))
                .query(&[("q", query)]),
        )
        .send()
        .await
        .expect("User search request failed")
    }

    /// GET /users/by-username/{username}
    pub async fn get_user_by_username(&self, username: &str) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/users/by-username/{}", self.base_url, username)),
        )
        .send()
        .await
        .expect("User lookup request failed")
    }

    /// POST /users/{id}/follow
    pub async fn follow(&self, user_id: usize) -> Response {
        self.bearer(
            self.client
                .post(format!("{}/users/{}/follow", self.base_url, user_id)),
        )
        .send()
        .await
        .expect("Follow request failed")
    }

    /// DELETE /users/{id}/follow
    pub async fn unfollow(&self, user_id: usize) -> Response {
        self.bearer(
            self.client
                .delete(format!("{}/users/{}/follow", self.base_url, user_id)),
        )
        .send()
        .await
        .expect("Unfollow request failed")
    }

    /// GET /users/{id}/followers
    pub async fn followers(&self, user_id: usize) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/users/{}/followers", self.base_url, user_id)),
        )
        .send()
        .await
        .expect("Followers request failed")
    }

    /// GET /users/{id}/following
    pub async fn following(&self, user_id: usize) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/users/{}/following", self.base_url, user_id)),
        )
        .send()
        .await
        .expect("Following request failed")
    }

    /// POST /users/{id}/profile-picture (multipart)
    pub async fn upload_profile_picture(&self, user_id: usize, bytes: Vec<u8>) -> Response {
        let part = reqwest::multipart::Part::bytes(bytes).file_name("avatar.png");
        let form = reqwest::multipart::Form::new().part("file", part);
        self.bearer(
            self.client
                .post(format!(
                    "{}/users/{}/profile-picture",
                    self.base_url, user_id
                ))
                .multipart(form),
        )
        .send()
        .await
        .expect("Profile picture upload failed")
    }

    /// GET /users/{id}/profile-picture
    pub async fn get_profile_picture(&self, user_id: usize) -> Response {
        self.client
            .get(format!(
                "{}/users/{}/profile-picture",
                self.base_url, user_id
            ))
            .send()
            .await
            .expect("Profile picture fetch failed")
    }

    // ========================================================================
    // Library Endpoints
    // ========================================================================

    /// GET /statuses
    pub async fn list_statuses(&self) -> Response {
        self.bearer(self.client.get(format!("{}/statuses", self.base_url)))
            .send()
            .await
            .expect("Status list request failed")
    }

    /// POST /statuses
    pub async fn create_status(&self, album_id: &str, status: &str, is_favorite: bool) -> Response {
        self.bearer(
            self.client
                .post(format!("{}/statuses", self.base_url))
                .json(&json!({
                    "album_id": album_id,
                    "status": status,
                    "is_favorite": is_favorite,
                })),
        )
        .send()
        .await
        .expect("Status create request failed")
    }

    /// PATCH /statuses/{id}
    pub async fn update_status(&self, status_id: usize, body: serde_json::Value) -> Response {
        self.bearer(
            self.client
                .patch(format!("{}/statuses/{}", self.base_url, status_id))
                .json(&body),
        )
        .send()
        .await
        .expect("Status update request failed")
    }

    /// DELETE /statuses/{id}
    pub async fn delete_status(&self, status_id: usize) -> Response {
        self.bearer(
            self.client
                .delete(format!("{}/statuses/{}", self.base_url, status_id)),
        )
        .send()
        .await
        .expect("Status delete request failed")
    }

    /// POST /albums/{id}/favorite
    pub async fn toggle_favorite(&self, album_id: &str) -> Response {
        self.bearer(
            self.client
                .post(format!("{}/albums/{}/favorite", self.base_url, album_id)),
        )
        .send()
        .await
        .expect("Toggle favorite request failed")
    }

    /// POST /reviews
    pub async fn create_review(
        &self,
        album_id: &str,
        rating: Option<f64>,
        content: &str,
    ) -> Response {
        self.bearer(
            self.client
                .post(format!("{}/reviews", self.base_url))
                .json(&json!({
                    "album_id": album_id,
                    "rating": rating,
                    "content": content,
                })),
        )
        .send()
        .await
        .expect("Review create request failed")
    }

    /// GET /reviews?album_id=
    pub async fn reviews_for_album(&self, album_id: &str) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/reviews", self.base_url))
                .query(&[("album_id", album_id)]),
        )
        .send()
        .await
        .expect("Review list request failed")
    }

    /// GET /reviews?user_id=
    pub async fn reviews_for_user(&self, user_id: usize) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/reviews", self.base_url))
                .query(&[("user_id", &user_id.to_string())]),
        )
        .send()
        .await
        .expect("Review list request failed")
    }

    /// DELETE /reviews/{id}
    pub async fn delete_review(&self, review_id: usize) -> Response {
        self.bearer(
            self.client
                .delete(format!("{}/reviews/{}", self.base_url, review_id)),
        )
        .send()
        .await
        .expect("Review delete request failed")
    }

    /// GET /albums/{id}/average-rating
    pub async fn average_rating(&self, album_id: &str) -> Response {
        self.bearer(self.client.get(format!(
            "{}/albums/{}/average-rating",
            self.base_url, album_id
        )))
        .send()
        .await
        .expect("Average rating request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /spotify/search?q=
    pub async fn spotify_search(&self, query: &str) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/spotify/search", self.base_url))
                .query(&[("q", query)]),
        )
        .send()
        .await
        .expect("Catalog search request failed")
    }

    /// GET /spotify/albums/{id}
    pub async fn spotify_album(&self, album_id: &str) -> Response {
        self.bearer(
            self.client
                .get(format!("{}/spotify/albums/{}", self.base_url, album_id)),
        )
        .send()
        .await
        .expect("Catalog album request failed")
    }
}

/// Rebuilds a `reqwest::Response` from already-read bytes so `login()`
/// can both stash the tokens and hand the body back to the caller.
fn http_response_from(bytes: Vec<u8>) -> Response {
    let response = http::Response::builder()
        .status(http::StatusCode::OK)
        .body(bytes)
        .unwrap();
    Response::from(response)
}
