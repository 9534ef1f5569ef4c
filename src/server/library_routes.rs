//! Album statuses, favorites, reviews and aggregate ratings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::session::Session;
use super::state::{GuardedLibraryManager, ServerState};
use crate::library::{AlbumStatus, Review, StatusKind};

#[derive(Deserialize, Debug)]
struct CreateStatusBody {
    pub album_id: String,
    pub status: StatusKind,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Deserialize, Debug)]
struct UpdateStatusBody {
    pub status: Option<StatusKind>,
    pub is_favorite: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct CreateReviewBody {
    pub album_id: String,
    pub rating: Option<f64>,
    pub content: String,
}

#[derive(Deserialize, Debug)]
struct ReviewsQuery {
    pub album_id: Option<String>,
    pub user_id: Option<usize>,
}

#[derive(Serialize)]
struct AverageRatingResponse {
    pub album_id: String,
    pub average_rating: Option<f64>,
}

async fn list_statuses(
    session: Session,
    State(library): State<GuardedLibraryManager>,
) -> Result<Json<Vec<AlbumStatus>>, ApiError> {
    Ok(Json(library.list_statuses(session.user_id)?))
}

async fn create_status(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Json(body): Json<CreateStatusBody>,
) -> Result<impl IntoResponse, ApiError> {
    let status = library.set_status(
        session.user_id,
        &body.album_id,
        body.status,
        body.is_favorite,
    )?;
    Ok((StatusCode::CREATED, Json(status)))
}

async fn update_status(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(status_id): Path<usize>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<AlbumStatus>, ApiError> {
    let updated =
        library.update_status(session.user_id, status_id, body.status, body.is_favorite)?;
    Ok(Json(updated))
}

async fn delete_status(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(status_id): Path<usize>,
) -> Result<StatusCode, ApiError> {
    library.remove_status(session.user_id, status_id)?;
    Ok(StatusCode::OK)
}

async fn toggle_favorite(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(album_id): Path<String>,
) -> Result<Json<AlbumStatus>, ApiError> {
    Ok(Json(library.toggle_favorite(session.user_id, &album_id)?))
}

async fn create_review(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Json(body): Json<CreateReviewBody>,
) -> Result<impl IntoResponse, ApiError> {
    let review = library.create_review(
        session.user_id,
        &body.album_id,
        body.rating,
        &body.content,
    )?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_reviews(
    _session: Session,
    State(library): State<GuardedLibraryManager>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    match (query.album_id, query.user_id) {
        (Some(album_id), None) => Ok(Json(library.reviews_for_album(&album_id)?)),
        (None, Some(user_id)) => Ok(Json(library.reviews_for_user(user_id)?)),
        _ => Err(ApiError::validation(
            "album_id",
            "exactly one of album_id or user_id is required",
        )),
    }
}

async fn delete_review(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(review_id): Path<usize>,
) -> Result<StatusCode, ApiError> {
    library.delete_review(session.user_id, review_id)?;
    Ok(StatusCode::OK)
}

async fn average_rating(
    _session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(album_id): Path<String>,
) -> Result<Json<AverageRatingResponse>, ApiError> {
    let average = library.average_rating(&album_id)?;
    Ok(Json(AverageRatingResponse {
        album_id,
        average_rating: average,
    }))
}

pub fn make_library_routes(state: ServerState) -> Router {
    Router::new()
        .route("/statuses", get(list_statuses).post(create_status))
        .route(
            "/statuses/{id}",
            delete(delete_status).patch(update_status),
        )
        .route("/albums/{id}/favorite", post(toggle_favorite))
        .route("/albums/{id}/average-rating", get(average_rating))
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", delete(delete_review))
        .with_state(state)
}
