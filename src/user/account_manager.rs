//! Account lifecycle: registration, email verification, login and token
//! refresh.

use super::account_models::{Account, NewPasswordCredentials, VerificationToken};
use super::auth::{VerificationTokenValue, WaxlogHasher};
use super::store::FullUserStore;
use super::tokens::{TokenError, TokenKind, TokenPair, TokenSigner};
use crate::mailer::VerificationMailer;

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 32;
const PASSWORD_MIN_LEN: usize = 8;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

/// A validation failure tied to the form field that caused it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("registration validation failed")]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("email address not verified")]
    EmailNotVerified,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result of resolving a verification link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    Success,
    AlreadyVerified,
    Expired,
    Invalid,
}

pub struct AccountManager {
    store: Arc<dyn FullUserStore>,
    signer: TokenSigner,
    mailer: Arc<dyn VerificationMailer>,
    verification_base_url: String,
    verification_ttl_secs: i64,
}

impl AccountManager {
    pub fn new(
        store: Arc<dyn FullUserStore>,
        signer: TokenSigner,
        mailer: Arc<dyn VerificationMailer>,
        verification_base_url: String,
        verification_ttl_secs: i64,
    ) -> Self {
        Self {
            store,
            signer,
            mailer,
            verification_base_url,
            verification_ttl_secs,
        }
    }

    fn validate_registration_fields(
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if username.len() < USERNAME_MIN_LEN || username.len() > USERNAME_MAX_LEN {
            errors.push(FieldError::new(
                "username",
                format!(
                    "username must be between {} and {} characters",
                    USERNAME_MIN_LEN, USERNAME_MAX_LEN
                ),
            ));
        } else if !username_regex().is_match(username) {
            errors.push(FieldError::new(
                "username",
                "username may only contain letters, digits, '_', '.' and '-'",
            ));
        }

        if !email_regex().is_match(email) {
            errors.push(FieldError::new("email", "not a valid email address"));
        }

        if password.len() < PASSWORD_MIN_LEN {
            errors.push(FieldError::new(
                "password",
                format!("password must be at least {} characters", PASSWORD_MIN_LEN),
            ));
        }

        if password != confirm_password {
            errors.push(FieldError::new(
                "confirm_password",
                "passwords do not match",
            ));
        }

        errors
    }

    /// Creates an unverified account and mails out the verification link.
    /// No account is created when any field fails validation; duplicate
    /// username/email surface as field-scoped errors too.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Account, RegisterError> {
        let mut errors =
            Self::validate_registration_fields(username, email, password, confirm_password);

        if errors.is_empty() {
            if self
                .store
                .get_account_by_username(username)
                .map_err(RegisterError::Internal)?
                .is_some()
            {
                errors.push(FieldError::new("username", "username is already taken"));
            }
            if self
                .store
                .get_account_by_email(email)
                .map_err(RegisterError::Internal)?
                .is_some()
            {
                errors.push(FieldError::new("email", "email is already registered"));
            }
        }

        if !errors.is_empty() {
            return Err(RegisterError::Validation(errors));
        }

        let hasher = WaxlogHasher::default_hasher();
        let salt = hasher.generate_b64_salt();
        let hash = hasher
            .hash(password.as_bytes(), &salt)
            .map_err(RegisterError::Internal)?;

        let user_id = self
            .store
            .create_account(username, email, NewPasswordCredentials { salt, hash, hasher })
            .map_err(RegisterError::Internal)?;

        let now = Utc::now().timestamp();
        let token = VerificationTokenValue::generate();
        self.store
            .add_verification_token(VerificationToken {
                user_id,
                value: token.clone(),
                created: now,
                expires: now + self.verification_ttl_secs,
            })
            .map_err(RegisterError::Internal)?;

        let verify_url = format!("{}/verify?token={}", self.verification_base_url, token.0);
        self.mailer.send_verification(email, username, &verify_url);
        info!("Registered new account {} (user_id={})", username, user_id);

        let account = self
            .store
            .get_account(user_id)
            .map_err(RegisterError::Internal)?
            .context("account vanished right after creation")
            .map_err(RegisterError::Internal)?;
        Ok(account)
    }

    /// Resolves a verification link. Idempotent for accounts that are
    /// already verified.
    pub fn verify(&self, token: &str) -> Result<VerifyOutcome> {
        let value = VerificationTokenValue(token.to_string());
        let Some(pending) = self.store.get_verification_token(&value)? else {
            debug!("Verification token not found");
            return Ok(VerifyOutcome::Invalid);
        };

        let Some(account) = self.store.get_account(pending.user_id)? else {
            return Ok(VerifyOutcome::Invalid);
        };
        if account.verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }
        if pending.expires < Utc::now().timestamp() {
            return Ok(VerifyOutcome::Expired);
        }

        self.store.mark_verified(pending.user_id)?;
        info!("Verified account {} (user_id={})", account.username, account.id);
        Ok(VerifyOutcome::Success)
    }

    /// Authenticates a username/password pair and issues a token pair.
    /// An unverified account is reported as such regardless of password
    /// correctness, so the client can prompt for re-verification.
    pub fn login(&self, username: &str, password: &str) -> Result<TokenPair, LoginError> {
        let account = self
            .store
            .get_account_by_username(username)
            .map_err(LoginError::Internal)?
            .ok_or(LoginError::InvalidCredentials)?;

        if !account.verified {
            return Err(LoginError::EmailNotVerified);
        }

        let credentials = self
            .store
            .get_password_credentials(username)
            .map_err(LoginError::Internal)?
            .ok_or(LoginError::InvalidCredentials)?;

        let password_matches = credentials
            .hasher
            .verify(password, &credentials.hash, &credentials.salt)
            .map_err(LoginError::Internal)?;
        if !password_matches {
            return Err(LoginError::InvalidCredentials);
        }

        self.store
            .touch_password_credentials(account.id)
            .map_err(LoginError::Internal)?;

        debug!("Issuing token pair for user_id={}", account.id);
        self.signer.issue_pair(account.id).map_err(LoginError::Internal)
    }

    /// Mints a new access token from a refresh token. The refresh token
    /// is not rotated.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let user_id = self.signer.verify(refresh_token, TokenKind::Refresh)?;
        self.signer
            .issue_access(user_id)
            .map_err(|_| TokenError::Invalid)
    }

    /// Validates a bearer access token, returning the user id it names.
    pub fn authenticate(&self, access_token: &str) -> Result<usize, TokenError> {
        self.signer.verify(access_token, TokenKind::Access)
    }

    pub fn get_account(&self, user_id: usize) -> Result<Option<Account>> {
        self.store.get_account(user_id)
    }
}
