//! API error taxonomy and its wire representation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::library::LibraryError;
use crate::user::account_manager::{FieldError, LoginError, RegisterError};
use crate::user::tokens::TokenError;

pub const AUTH_INVALID_CREDENTIALS: &str = "invalid_credentials";
pub const AUTH_EMAIL_NOT_VERIFIED: &str = "email_not_verified";
pub const AUTH_TOKEN_EXPIRED: &str = "token_expired";
pub const AUTH_TOKEN_INVALID: &str = "token_invalid";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-scoped form validation failures, surfaced inline per field.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Authentication failures, with a code the client maps to a
    /// tailored message.
    #[error("{message}")]
    Auth {
        code: &'static str,
        message: String,
    },

    /// Ownership violations.
    #[error("not allowed")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Upstream catalog failure with no empty-set degrade target.
    #[error("upstream catalog unavailable")]
    Upstream,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn auth(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Auth {
            code,
            message: message.into(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            field,
            message: message.into(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({"error": "validation", "fields": fields}),
            ),
            ApiError::Auth { code, message } => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"error": "auth", "code": code, "message": message}),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": "forbidden"}),
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({"error": "not_found", "resource": resource}),
            ),
            ApiError::Upstream => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({"error": "upstream"}),
            ),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": "internal"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::auth(AUTH_TOKEN_EXPIRED, "token expired"),
            TokenError::Invalid => ApiError::auth(AUTH_TOKEN_INVALID, "token invalid"),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => {
                ApiError::auth(AUTH_INVALID_CREDENTIALS, "invalid username or password")
            }
            LoginError::EmailNotVerified => {
                ApiError::auth(AUTH_EMAIL_NOT_VERIFIED, "email address not verified")
            }
            LoginError::Internal(err) => ApiError::Internal(err),
        }
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Validation(fields) => ApiError::Validation(fields),
            RegisterError::Internal(err) => ApiError::Internal(err),
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Validation { field, message } => ApiError::validation(field, message),
            LibraryError::Forbidden => ApiError::Forbidden,
            LibraryError::NotFound(resource) => ApiError::NotFound(resource),
            LibraryError::Internal(err) => ApiError::Internal(err),
        }
    }
}
