//! Registration, verification, login, token refresh and `/me`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ApiError;
use super::session::Session;
use super::state::{GuardedAccountManager, ServerState};
use crate::user::account_manager::VerifyOutcome;
use crate::user::{Account, TokenPair};

#[derive(Deserialize, Debug)]
struct RegisterBody {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Deserialize, Debug)]
struct VerifyQuery {
    pub token: String,
}

#[derive(Serialize)]
struct VerifyResponse {
    status: VerifyOutcome,
}

#[derive(Serialize)]
struct AccessTokenResponse {
    access_token: String,
}

async fn register(
    State(account_manager): State<GuardedAccountManager>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    debug!("register() called for username {}", body.username);
    let account = account_manager.register(
        &body.username,
        &body.email,
        &body.password,
        &body.confirm_password,
    )?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn verify(
    State(account_manager): State<GuardedAccountManager>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let status = account_manager.verify(&query.token)?;
    Ok(Json(VerifyResponse { status }))
}

async fn login(
    State(account_manager): State<GuardedAccountManager>,
    Form(body): Form<LoginForm>,
) -> Result<Json<TokenPair>, ApiError> {
    debug!("login() called for username {}", body.username);
    let pair = account_manager.login(&body.username, &body.password)?;
    Ok(Json(pair))
}

async fn refresh(
    State(account_manager): State<GuardedAccountManager>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let access_token = account_manager.refresh(&body.refresh_token)?;
    Ok(Json(AccessTokenResponse { access_token }))
}

async fn me(
    session: Session,
    State(account_manager): State<GuardedAccountManager>,
) -> Result<Json<Account>, ApiError> {
    let account = account_manager
        .get_account(session.user_id)?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(account))
}

pub fn make_auth_routes(state: ServerState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/verify", get(verify))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .with_state(state)
}
