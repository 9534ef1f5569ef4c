//! Test server lifecycle management
//!
//! Each test gets an isolated server on a random port with its own
//! temporary database, a recording mailer (so tests can read the
//! verification links that would have been emailed) and optionally a
//! stub upstream catalog.

use super::constants::*;
use super::fixtures::seed_test_users;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use waxlog_server::catalog::CatalogClient;
use waxlog_server::mailer::RecordingMailer;
use waxlog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use waxlog_server::user::{AccountManager, FullUserStore, SqliteUserStore, TokenSigner};

const DEFAULT_ACCESS_TTL_SECS: i64 = 3600;
const REFRESH_TTL_SECS: i64 = 7 * 24 * 3600;

/// Test server instance with isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// User store for direct database access in tests
    pub user_store: Arc<SqliteUserStore>,

    /// Captures verification mails so tests can extract tokens
    pub mailer: Arc<RecordingMailer>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server with default token lifetimes and no catalog.
    pub async fn spawn() -> Self {
        Self::spawn_with(DEFAULT_ACCESS_TTL_SECS, None).await
    }

    /// Spawns a test server whose access tokens expire after
    /// `access_ttl_secs` seconds (use a short value to exercise the
    /// refresh path).
    pub async fn spawn_with_access_ttl(access_ttl_secs: i64) -> Self {
        Self::spawn_with(access_ttl_secs, None).await
    }

    /// Spawns a test server proxying catalog requests to the given client.
    pub async fn spawn_with_catalog(catalog: Arc<dyn CatalogClient>) -> Self {
        Self::spawn_with(DEFAULT_ACCESS_TTL_SECS, Some(catalog)).await
    }

    async fn spawn_with(access_ttl_secs: i64, catalog: Option<Arc<dyn CatalogClient>>) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");

        let user_store = Arc::new(
            SqliteUserStore::new(temp_db_dir.path().join("user.db"))
                .expect("Failed to open user store"),
        );
        seed_test_users(&user_store).expect("Failed to seed test users");

        let mailer = Arc::new(RecordingMailer::default());

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let account_manager = Arc::new(AccountManager::new(
            user_store.clone() as Arc<dyn FullUserStore>,
            TokenSigner::new(TEST_TOKEN_SECRET, access_ttl_secs, REFRESH_TTL_SECS),
            mailer.clone(),
            base_url.clone(),
            3600,
        ));

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            media_path: temp_db_dir.path().to_path_buf(),
            frontend_url: None,
            frontend_dir_path: None,
        };

        let app = make_app(
            config,
            user_store.clone() as Arc<dyn FullUserStore>,
            account_manager,
            catalog,
        )
        .expect("Failed to build app");

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            user_store,
            mailer,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir cleans up automatically
    }
}
