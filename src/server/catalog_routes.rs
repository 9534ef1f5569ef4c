//! Proxy routes to the external album catalog.
//!
//! Search never breaks the page: an unconfigured or failing upstream
//! degrades to an empty result set instead of an error.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

use super::error::ApiError;
use super::session::Session;
use super::state::{OptionalCatalogClient, ServerState};
use crate::catalog::{AlbumDetail, AlbumSummary};

const MAX_SEARCH_RESULTS: usize = 50;

fn default_search_limit() -> usize {
    20
}

#[derive(Deserialize, Debug)]
struct AlbumSearchQuery {
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

async fn search_albums(
    _session: Session,
    State(catalog): State<OptionalCatalogClient>,
    Query(query): Query<AlbumSearchQuery>,
) -> Json<Vec<AlbumSummary>> {
    let Some(catalog) = catalog else {
        return Json(vec![]);
    };
    if query.q.trim().is_empty() {
        return Json(vec![]);
    }

    match catalog
        .search_albums(&query.q, query.limit.min(MAX_SEARCH_RESULTS))
        .await
    {
        Ok(albums) => Json(albums),
        Err(err) => {
            warn!("Catalog search failed, serving empty results: {:#}", err);
            Json(vec![])
        }
    }
}

async fn get_album(
    _session: Session,
    State(catalog): State<OptionalCatalogClient>,
    Path(id): Path<String>,
) -> Result<Json<AlbumDetail>, ApiError> {
    let Some(catalog) = catalog else {
        return Err(ApiError::NotFound("album"));
    };

    match catalog.get_album(&id).await {
        Ok(Some(album)) => Ok(Json(album)),
        Ok(None) => Err(ApiError::NotFound("album")),
        Err(err) => {
            warn!("Catalog album lookup failed for {}: {:#}", id, err);
            Err(ApiError::NotFound("album"))
        }
    }
}

pub fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/spotify/search", get(search_albums))
        .route("/spotify/albums/{id}", get(get_album))
        .with_state(state)
}
