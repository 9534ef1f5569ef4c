mod auth_routes;
mod catalog_routes;
pub mod config;
pub mod error;
mod http_layers;
mod library_routes;
pub mod server;
pub(self) mod session;
pub mod state;
mod user_routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use http_layers::*;
pub use server::{make_app, run_server};
