pub mod models;
pub mod spotify;

pub use models::{AlbumDetail, AlbumSummary, TrackEntry};
pub use spotify::{CatalogClient, SpotifyClient};
