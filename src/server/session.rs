use super::error::{ApiError, AUTH_TOKEN_INVALID};
use super::state::ServerState;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;

/// The authenticated caller, extracted from the bearer access token on
/// every protected route.
#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
}

const BEARER_PREFIX: &str = "Bearer ";

fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
}

fn extract_session(parts: &Parts, ctx: &ServerState) -> Result<Session, ApiError> {
    let token = extract_bearer_token(parts)
        .ok_or_else(|| ApiError::auth(AUTH_TOKEN_INVALID, "missing bearer token"))?;

    let user_id = ctx.account_manager.authenticate(token)?;
    debug!("Authenticated request for user_id={}", user_id);
    Ok(Session { user_id })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session(parts, ctx)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session(parts, ctx).ok())
    }
}
