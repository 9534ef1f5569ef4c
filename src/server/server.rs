use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::HeaderValue, middleware, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::catalog::CatalogClient;
use crate::library::LibraryManager;
use crate::user::{AccountManager, FullUserStore};

use super::auth_routes::make_auth_routes;
use super::catalog_routes::make_catalog_routes;
use super::library_routes::make_library_routes;
use super::session::Session;
use super::state::ServerState;
use super::user_routes::make_user_routes;
use super::{log_requests, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub user_id: Option<usize>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> Json<ServerStats> {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        user_id: session.map(|s| s.user_id),
    })
}

pub fn make_app(
    config: ServerConfig,
    user_store: Arc<dyn FullUserStore>,
    account_manager: Arc<AccountManager>,
    catalog: Option<Arc<dyn CatalogClient>>,
) -> Result<Router> {
    let library = Arc::new(LibraryManager::new(user_store.clone()));
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        user_store,
        account_manager,
        library,
        catalog,
    };

    let api_routes = make_auth_routes(state.clone())
        .merge(make_user_routes(state.clone()))
        .merge(make_library_routes(state.clone()))
        .merge(make_catalog_routes(state.clone()));

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let cors = match &config.frontend_url {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = home_router
        .merge(api_routes)
        .layer(cors)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    user_store: Arc<dyn FullUserStore>,
    account_manager: Arc<AccountManager>,
    catalog: Option<Arc<dyn CatalogClient>>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_store, account_manager, catalog)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
