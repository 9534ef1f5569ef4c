//! Test fixture creation: seeded user accounts.

use super::constants::*;
use anyhow::Result;
use waxlog_server::user::account_models::NewPasswordCredentials;
use waxlog_server::user::auth::WaxlogHasher;
use waxlog_server::user::{AccountStore, SqliteUserStore};

/// Seeds the standard set of test users: two verified accounts and one
/// that never clicked its verification link.
pub fn seed_test_users(store: &SqliteUserStore) -> Result<()> {
    let alice = create_user_with_password(store, TEST_USER, TEST_EMAIL, TEST_PASS)?;
    store.mark_verified(alice)?;

    let bob = create_user_with_password(store, OTHER_USER, OTHER_EMAIL, OTHER_PASS)?;
    store.mark_verified(bob)?;

    create_user_with_password(store, UNVERIFIED_USER, UNVERIFIED_EMAIL, UNVERIFIED_PASS)?;

    Ok(())
}

/// Creates an account with hashed password credentials, bypassing the
/// registration endpoint.
pub fn create_user_with_password(
    store: &SqliteUserStore,
    username: &str,
    email: &str,
    password: &str,
) -> Result<usize> {
    let hasher = WaxlogHasher::default_hasher();
    let salt = hasher.generate_b64_salt();
    let hash = hasher.hash(password.as_bytes(), &salt)?;

    store.create_account(username, email, NewPasswordCredentials { salt, hash, hasher })
}
