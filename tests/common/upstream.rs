//! Stub upstream catalog service.
//!
//! A tiny axum app that mimics the external catalog: a client-credentials
//! token endpoint plus album search and detail routes serving canned
//! data. Tests point a `SpotifyClient` at it to exercise the proxy
//! end-to-end.

use super::constants::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct StubState {
    token_requests: AtomicUsize,
    search_requests: AtomicUsize,
}

/// A running stub catalog. Dropping it shuts the stub down.
pub struct StubCatalog {
    pub base_url: String,
    state: Arc<StubState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

async fn token(State(state): State<Arc<StubState>>) -> Json<serde_json::Value> {
    state.token_requests.fetch_add(1, Ordering::Relaxed);
    Json(json!({
        "access_token": "stub-upstream-token",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

fn stub_album_1() -> serde_json::Value {
    json!({
        "id": STUB_ALBUM_1_ID,
        "name": STUB_ALBUM_1_TITLE,
        "artists": [{"name": STUB_ALBUM_1_ARTIST}],
        "images": [{"url": "https://covers.example/stub-album-1.jpg", "width": 640, "height": 640}],
        "release_date": "1998-04-07",
        "tracks": {
            "items": [
                {"name": "Opening Number", "track_number": 1, "duration_ms": 215000},
                {"name": "Closing Number", "track_number": 2, "duration_ms": 187000}
            ]
        }
    })
}

fn stub_album_2() -> serde_json::Value {
    json!({
        "id": STUB_ALBUM_2_ID,
        "name": STUB_ALBUM_2_TITLE,
        "artists": [{"name": STUB_ALBUM_1_ARTIST}],
        "images": [],
        "release_date": "2001-09-12"
    })
}

async fn search(State(state): State<Arc<StubState>>) -> Json<serde_json::Value> {
    state.search_requests.fetch_add(1, Ordering::Relaxed);
    Json(json!({
        "albums": { "items": [stub_album_1(), stub_album_2()] }
    }))
}

async fn album(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        STUB_ALBUM_1_ID => Json(stub_album_1()).into_response(),
        STUB_ALBUM_2_ID => Json(stub_album_2()).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

impl StubCatalog {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState::default());

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/search", get(search))
            .route("/v1/albums/{id}", get(album))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub catalog");
        let port = listener
            .local_addr()
            .expect("Failed to get stub address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Stub catalog failed");
        });

        Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn api_base(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::Relaxed)
    }

    pub fn search_requests(&self) -> usize {
        self.state.search_requests.load(Ordering::Relaxed)
    }

    /// Shuts the stub down, leaving its port dangling for
    /// upstream-unreachable scenarios.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for StubCatalog {
    fn drop(&mut self) {
        self.shutdown();
    }
}
