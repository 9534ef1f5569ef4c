//! Common test infrastructure
//!
//! Everything the end-to-end tests need: an isolated server per test, an
//! HTTP client wrapper, seeded users and a stub upstream catalog. Tests
//! import from this module only, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer, TEST_PASS, TEST_USER};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_login() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.login(TEST_USER, TEST_PASS).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;
mod upstream;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use server::TestServer;
#[allow(unused_imports)]
pub use upstream::StubCatalog;

// Keep fixtures internal - only accessed via TestServer::spawn()
#[allow(unused_imports)]
pub(crate) use fixtures::seed_test_users;
