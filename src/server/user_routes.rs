//! User search, public profiles, follow edges and profile pictures.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ApiError;
use super::session::Session;
use super::state::{GuardedLibraryManager, GuardedUserStore, ServerState};
use crate::user::UserSummary;

const USER_SEARCH_LIMIT: usize = 20;
const MAX_PROFILE_PICTURE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize, Debug)]
struct UserSearchQuery {
    pub q: String,
}

/// A public profile: summary plus follow counts.
#[derive(Serialize)]
struct ProfileResponse {
    pub id: usize,
    pub username: String,
    pub profile_picture: Option<String>,
    pub followers: usize,
    pub following: usize,
}

async fn search_users(
    _session: Session,
    State(user_store): State<GuardedUserStore>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    if query.q.trim().is_empty() {
        return Ok(Json(vec![]));
    }
    let results = user_store.search_accounts(&query.q, USER_SEARCH_LIMIT)?;
    Ok(Json(results))
}

async fn get_user_by_username(
    _session: Session,
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state
        .user_store
        .get_account_by_username(&username)?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(ProfileResponse {
        followers: state.user_store.count_followers(account.id)?,
        following: state.user_store.count_following(account.id)?,
        id: account.id,
        username: account.username,
        profile_picture: account.profile_picture,
    }))
}

async fn follow_user(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(target_id): Path<usize>,
) -> Result<StatusCode, ApiError> {
    library.follow(session.user_id, target_id)?;
    Ok(StatusCode::CREATED)
}

async fn unfollow_user(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(target_id): Path<usize>,
) -> Result<StatusCode, ApiError> {
    library.unfollow(session.user_id, target_id)?;
    Ok(StatusCode::OK)
}

async fn list_followers(
    _session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(user_id): Path<usize>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(library.list_followers(user_id)?))
}

async fn list_following(
    _session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(user_id): Path<usize>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(library.list_following(user_id)?))
}

#[derive(Serialize)]
struct ProfilePictureResponse {
    profile_picture: String,
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

async fn upload_profile_picture(
    session: Session,
    State(state): State<ServerState>,
    Path(user_id): Path<usize>,
    mut multipart: Multipart,
) -> Result<Json<ProfilePictureResponse>, ApiError> {
    if session.user_id != user_id {
        return Err(ApiError::Forbidden);
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("file", "malformed multipart body"))?
        .ok_or_else(|| ApiError::validation("file", "no file in request"))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|_| ApiError::validation("file", "could not read uploaded file"))?;

    if bytes.len() > MAX_PROFILE_PICTURE_BYTES {
        return Err(ApiError::validation("file", "file is too large"));
    }

    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .ok_or_else(|| ApiError::validation("file", "file is not an image"))?;
    let ext = extension_for_mime(mime)
        .ok_or_else(|| ApiError::validation("file", "unsupported image format"))?;

    let relative_path = format!("profile_pictures/{}.{}", Uuid::new_v4(), ext);
    let target = state.config.media_path.join(&relative_path);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| ApiError::Internal(err.into()))?;
    }
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;

    debug!("Stored profile picture for user {} at {:?}", user_id, target);

    let previous = state
        .user_store
        .set_profile_picture(user_id, &relative_path)?;

    // The replaced file is dead weight; losing the removal is harmless.
    if let Some(previous) = previous {
        let old_path = state.config.media_path.join(previous);
        if let Err(err) = tokio::fs::remove_file(&old_path).await {
            warn!("Could not remove old profile picture {:?}: {}", old_path, err);
        }
    }

    Ok(Json(ProfilePictureResponse {
        profile_picture: relative_path,
    }))
}

async fn get_profile_picture(
    State(state): State<ServerState>,
    Path(user_id): Path<usize>,
) -> Result<Response, ApiError> {
    let account = state
        .user_store
        .get_account(user_id)?
        .ok_or(ApiError::NotFound("user"))?;
    let relative_path = account
        .profile_picture
        .ok_or(ApiError::NotFound("profile picture"))?;

    let file_path = state.config.media_path.join(relative_path);
    let buffer = tokio::fs::read(&file_path)
        .await
        .map_err(|_| ApiError::NotFound("profile picture"))?;

    if let Some(kind) = infer::get(&buffer) {
        if kind.mime_type().starts_with("image/") {
            return Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, kind.mime_type().to_string())
                .body(buffer.into())
                .unwrap());
        }
    }
    Err(ApiError::NotFound("profile picture"))
}

pub fn make_user_routes(state: ServerState) -> Router {
    Router::new()
        .route("/users", get(search_users))
        .route("/users/by-username/{username}", get(get_user_by_username))
        .route(
            "/users/{id}/follow",
            post(follow_user).delete(unfollow_user),
        )
        .route("/users/{id}/followers", get(list_followers))
        .route("/users/{id}/following", get(list_following))
        .route(
            "/users/{id}/profile-picture",
            post(upload_profile_picture).get(get_profile_picture),
        )
        .with_state(state)
}
