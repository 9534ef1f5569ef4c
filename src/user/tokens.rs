//! Signed access/refresh token pairs.
//!
//! Both tokens are HS256 JWTs minted from the same secret: a short-lived
//! access token presented as a bearer credential on every protected call,
//! and a longer-lived refresh token whose only accepted use is minting a
//! new access token. The refresh token itself is never rotated.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    token_use: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    fn issue(&self, kind: TokenKind, user_id: usize) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl,
            token_use: kind.as_str().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .with_context(|| format!("Failed to sign {} token", kind.as_str()))
    }

    pub fn issue_access(&self, user_id: usize) -> Result<String> {
        self.issue(TokenKind::Access, user_id)
    }

    pub fn issue_pair(&self, user_id: usize) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(TokenKind::Access, user_id)?,
            refresh_token: self.issue(TokenKind::Refresh, user_id)?,
        })
    }

    /// Verifies signature, expiry and intended use, returning the user id.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<usize, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.token_use != kind.as_str() {
            return Err(TokenError::Invalid);
        }
        data.claims.sub.parse().map_err(|_| TokenError::Invalid)
    }
}
