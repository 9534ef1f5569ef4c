use super::models::{AlbumStatus, Review, StatusKind};
use crate::user::UserSummary;
use anyhow::Result;

/// Storage for the per-user relationship data: album statuses, reviews
/// and follow edges. Writes that target a (user, album) identity are
/// atomic conditional writes backed by unique constraints, never
/// read-then-write.
pub trait LibraryStore: Send + Sync {
    /// Inserts or replaces the status row for (user, album) and returns
    /// the resulting row.
    fn upsert_status(
        &self,
        user_id: usize,
        album_id: &str,
        status: StatusKind,
        is_favorite: bool,
    ) -> Result<AlbumStatus>;

    /// Returns Ok(None) if the row does not exist.
    fn get_status(&self, status_id: usize) -> Result<Option<AlbumStatus>>;

    /// Applies a partial update. Returns Ok(None) if the row does not
    /// exist. Ownership is the caller's concern.
    fn update_status(
        &self,
        status_id: usize,
        status: Option<StatusKind>,
        is_favorite: Option<bool>,
    ) -> Result<Option<AlbumStatus>>;

    /// Returns true if a row was deleted.
    fn delete_status(&self, status_id: usize) -> Result<bool>;

    /// All status rows of a user, most recently updated first.
    fn list_statuses(&self, user_id: usize) -> Result<Vec<AlbumStatus>>;

    /// Single-statement toggle: no row yet creates
    /// {want-to-listen, favorite=true}, an existing row gets only its
    /// favorite flag flipped.
    fn toggle_favorite(&self, user_id: usize, album_id: &str) -> Result<AlbumStatus>;

    /// Creates a follow edge. Returns false if it already existed
    /// (double-follow is a no-op).
    fn add_follow(&self, follower_id: usize, followee_id: usize) -> Result<bool>;

    /// Returns true if an edge was deleted.
    fn remove_follow(&self, follower_id: usize, followee_id: usize) -> Result<bool>;

    fn list_followers(&self, user_id: usize) -> Result<Vec<UserSummary>>;

    fn list_following(&self, user_id: usize) -> Result<Vec<UserSummary>>;

    fn count_followers(&self, user_id: usize) -> Result<usize>;

    fn count_following(&self, user_id: usize) -> Result<usize>;

    /// Inserts or replaces the review for (user, album) and returns the
    /// resulting row. Rating validity is the caller's concern.
    fn upsert_review(
        &self,
        user_id: usize,
        album_id: &str,
        rating: Option<f64>,
        content: &str,
    ) -> Result<Review>;

    /// Returns Ok(None) if the row does not exist.
    fn get_review(&self, review_id: usize) -> Result<Option<Review>>;

    /// Returns true if a row was deleted.
    fn delete_review(&self, review_id: usize) -> Result<bool>;

    fn list_reviews_for_album(&self, album_id: &str) -> Result<Vec<Review>>;

    fn list_reviews_for_user(&self, user_id: usize) -> Result<Vec<Review>>;

    /// Arithmetic mean over non-null ratings; Ok(None) when the album has
    /// no rated reviews.
    fn average_rating(&self, album_id: &str) -> Result<Option<f64>>;
}
