pub mod manager;
pub mod models;
pub mod store;

pub use manager::{LibraryError, LibraryManager};
pub use models::{AlbumStatus, Review, StatusKind};
pub use store::LibraryStore;
