pub mod account_manager;
pub mod account_models;
pub mod auth;
mod sqlite_user_store;
pub mod store;
pub mod tokens;

pub use account_manager::{AccountManager, FieldError, LoginError, RegisterError, VerifyOutcome};
pub use account_models::{Account, PasswordCredentials, UserSummary, VerificationToken};
pub use auth::VerificationTokenValue;
pub use sqlite_user_store::SqliteUserStore;
pub use store::{AccountStore, FullUserStore, VerificationTokenStore};
pub use tokens::{TokenError, TokenKind, TokenPair, TokenSigner};
