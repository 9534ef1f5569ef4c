//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, stub catalog content),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Verified test user
pub const TEST_USER: &str = "alice";
pub const TEST_EMAIL: &str = "alice@example.com";
pub const TEST_PASS: &str = "alice-password-1";

/// Second verified test user (follow / ownership scenarios)
pub const OTHER_USER: &str = "bob";
pub const OTHER_EMAIL: &str = "bob@example.com";
pub const OTHER_PASS: &str = "bob-password-1";

/// Registered but never verified
pub const UNVERIFIED_USER: &str = "mallory";
pub const UNVERIFIED_EMAIL: &str = "mallory@example.com";
pub const UNVERIFIED_PASS: &str = "mallory-password-1";

/// Secret the test server signs tokens with
pub const TEST_TOKEN_SECRET: &str = "e2e-test-secret";

// ============================================================================
// Stub Catalog Content
// ============================================================================

pub const STUB_ALBUM_1_ID: &str = "stub-album-1";
pub const STUB_ALBUM_1_TITLE: &str = "Milestones";
pub const STUB_ALBUM_1_ARTIST: &str = "The Stub Quartet";

pub const STUB_ALBUM_2_ID: &str = "stub-album-2";
pub const STUB_ALBUM_2_TITLE: &str = "Other Milestones";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
