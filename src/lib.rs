//! Waxlog server library
//!
//! Social cataloging for music: accounts with email verification, album
//! statuses and favorites, reviews, follows, and a proxy to the external
//! album catalog. Exposed as a library so the e2e tests (and the bundled
//! API client) can reuse the internals.

pub mod catalog;
pub mod client;
pub mod config;
pub mod library;
pub mod mailer;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use client::{ApiClient, SessionContext};
pub use library::{LibraryManager, StatusKind};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{AccountManager, FullUserStore, SqliteUserStore, TokenSigner};
