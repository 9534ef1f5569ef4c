use axum::extract::FromRef;

use crate::catalog::CatalogClient;
use crate::library::LibraryManager;
use crate::user::{AccountManager, FullUserStore};
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserStore = Arc<dyn FullUserStore>;
pub type GuardedAccountManager = Arc<AccountManager>;
pub type GuardedLibraryManager = Arc<LibraryManager>;
pub type OptionalCatalogClient = Option<Arc<dyn CatalogClient>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_store: GuardedUserStore,
    pub account_manager: GuardedAccountManager,
    pub library: GuardedLibraryManager,
    pub catalog: OptionalCatalogClient,
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedAccountManager {
    fn from_ref(input: &ServerState) -> Self {
        input.account_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedLibraryManager {
    fn from_ref(input: &ServerState) -> Self {
        input.library.clone()
    }
}

impl FromRef<ServerState> for OptionalCatalogClient {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
