//! Account data models

use serde::{Deserialize, Serialize};

use super::auth::{VerificationTokenValue, WaxlogHasher};

/// A registered account, as stored. Serialized form is what `/me` and
/// `/register` return, so it carries no credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: usize,
    pub username: String,
    pub email: String,
    pub verified: bool,
    pub profile_picture: Option<String>,
    pub created: i64,
}

/// The public face of an account: what shows up in search results,
/// follower lists and review bylines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: usize,
    pub username: String,
    pub profile_picture: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PasswordCredentials {
    pub user_id: usize,
    pub salt: String,
    pub hash: String,
    pub hasher: WaxlogHasher,

    pub created: i64,
    pub last_used: Option<i64>,
}

/// Credential material for a brand new account, hashed before it ever
/// reaches the store.
#[derive(Clone, Debug)]
pub struct NewPasswordCredentials {
    pub salt: String,
    pub hash: String,
    pub hasher: WaxlogHasher,
}

#[derive(Clone, Debug)]
pub struct VerificationToken {
    pub user_id: usize,
    pub value: VerificationTokenValue,
    pub created: i64,
    pub expires: i64,
}
