use super::account_models::{
    Account, NewPasswordCredentials, PasswordCredentials, UserSummary, VerificationToken,
};
use super::auth::VerificationTokenValue;
use crate::library::LibraryStore;
use anyhow::Result;

pub trait AccountStore: Send + Sync {
    /// Creates an unverified account together with its password
    /// credentials in one transaction and returns the account id.
    /// Returns Err on duplicate username/email (unique constraints).
    fn create_account(
        &self,
        username: &str,
        email: &str,
        credentials: NewPasswordCredentials,
    ) -> Result<usize>;

    /// Returns Ok(None) if the account does not exist.
    fn get_account(&self, user_id: usize) -> Result<Option<Account>>;

    /// Returns Ok(None) if no account has this username.
    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Returns Ok(None) if no account has this email.
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Case-insensitive username substring search, ordered by username.
    fn search_accounts(&self, query: &str, limit: usize) -> Result<Vec<UserSummary>>;

    /// Flips the verified flag on. Idempotent.
    fn mark_verified(&self, user_id: usize) -> Result<()>;

    /// Replaces the profile picture reference and returns the previous
    /// one, if any.
    fn set_profile_picture(&self, user_id: usize, relative_path: &str) -> Result<Option<String>>;

    /// Returns Ok(None) if no account has this username.
    fn get_password_credentials(&self, username: &str) -> Result<Option<PasswordCredentials>>;

    /// Stamps the credentials' last_used timestamp.
    fn touch_password_credentials(&self, user_id: usize) -> Result<()>;
}

pub trait VerificationTokenStore: Send + Sync {
    fn add_verification_token(&self, token: VerificationToken) -> Result<()>;

    /// Returns Ok(None) if the token does not exist.
    fn get_verification_token(
        &self,
        value: &VerificationTokenValue,
    ) -> Result<Option<VerificationToken>>;

    /// Deletes tokens whose expiry lies before `now`. Returns the number
    /// of tokens deleted.
    fn prune_expired_verification_tokens(&self, now: i64) -> Result<usize>;
}

/// Combined trait for the single user-domain database: accounts,
/// verification tokens and the relationship library.
pub trait FullUserStore: AccountStore + VerificationTokenStore + LibraryStore {}

// Blanket implementation for any type covering all three store facets
impl<T: AccountStore + VerificationTokenStore + LibraryStore> FullUserStore for T {}
