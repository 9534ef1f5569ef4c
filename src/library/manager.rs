//! Business rules over the relationship store: ownership checks, rating
//! validation and the self-follow guard.

use super::models::{rating_is_valid, AlbumStatus, Review, StatusKind};
use crate::user::{FullUserStore, UserSummary};

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("not allowed")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LibraryError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LibraryError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub struct LibraryManager {
    store: Arc<dyn FullUserStore>,
}

impl LibraryManager {
    pub fn new(store: Arc<dyn FullUserStore>) -> Self {
        Self { store }
    }

    fn require_album_id(album_id: &str) -> Result<(), LibraryError> {
        if album_id.trim().is_empty() {
            return Err(LibraryError::validation("album_id", "album id is required"));
        }
        Ok(())
    }

    fn require_user(&self, user_id: usize) -> Result<(), LibraryError> {
        if self.store.get_account(user_id)?.is_none() {
            return Err(LibraryError::NotFound("user"));
        }
        Ok(())
    }

    pub fn set_status(
        &self,
        user_id: usize,
        album_id: &str,
        status: StatusKind,
        is_favorite: bool,
    ) -> Result<AlbumStatus, LibraryError> {
        Self::require_album_id(album_id)?;
        Ok(self
            .store
            .upsert_status(user_id, album_id, status, is_favorite)?)
    }

    pub fn update_status(
        &self,
        user_id: usize,
        status_id: usize,
        status: Option<StatusKind>,
        is_favorite: Option<bool>,
    ) -> Result<AlbumStatus, LibraryError> {
        let existing = self
            .store
            .get_status(status_id)?
            .ok_or(LibraryError::NotFound("status"))?;
        if existing.user_id != user_id {
            debug!(
                "User {} tried to update status {} owned by {}",
                user_id, status_id, existing.user_id
            );
            return Err(LibraryError::Forbidden);
        }

        self.store
            .update_status(status_id, status, is_favorite)?
            .ok_or(LibraryError::NotFound("status"))
    }

    pub fn remove_status(&self, user_id: usize, status_id: usize) -> Result<(), LibraryError> {
        let existing = self
            .store
            .get_status(status_id)?
            .ok_or(LibraryError::NotFound("status"))?;
        if existing.user_id != user_id {
            return Err(LibraryError::Forbidden);
        }
        self.store.delete_status(status_id)?;
        Ok(())
    }

    pub fn toggle_favorite(
        &self,
        user_id: usize,
        album_id: &str,
    ) -> Result<AlbumStatus, LibraryError> {
        Self::require_album_id(album_id)?;
        Ok(self.store.toggle_favorite(user_id, album_id)?)
    }

    pub fn list_statuses(&self, user_id: usize) -> Result<Vec<AlbumStatus>, LibraryError> {
        Ok(self.store.list_statuses(user_id)?)
    }

    pub fn follow(&self, follower_id: usize, followee_id: usize) -> Result<(), LibraryError> {
        if follower_id == followee_id {
            return Err(LibraryError::validation(
                "user_id",
                "cannot follow yourself",
            ));
        }
        self.require_user(followee_id)?;
        // Double-follow is a no-op
        self.store.add_follow(follower_id, followee_id)?;
        Ok(())
    }

    pub fn unfollow(&self, follower_id: usize, followee_id: usize) -> Result<(), LibraryError> {
        self.require_user(followee_id)?;
        self.store.remove_follow(follower_id, followee_id)?;
        Ok(())
    }

    pub fn list_followers(&self, user_id: usize) -> Result<Vec<UserSummary>, LibraryError> {
        self.require_user(user_id)?;
        Ok(self.store.list_followers(user_id)?)
    }

    pub fn list_following(&self, user_id: usize) -> Result<Vec<UserSummary>, LibraryError> {
        self.require_user(user_id)?;
        Ok(self.store.list_following(user_id)?)
    }

    pub fn create_review(
        &self,
        user_id: usize,
        album_id: &str,
        rating: Option<f64>,
        content: &str,
    ) -> Result<Review, LibraryError> {
        Self::require_album_id(album_id)?;
        if let Some(rating) = rating {
            if !rating_is_valid(rating) {
                return Err(LibraryError::validation(
                    "rating",
                    "rating must be between 1 and 5 in half-point steps",
                ));
            }
        }
        if content.trim().is_empty() {
            return Err(LibraryError::validation(
                "content",
                "review content is required",
            ));
        }
        Ok(self.store.upsert_review(user_id, album_id, rating, content)?)
    }

    pub fn delete_review(&self, user_id: usize, review_id: usize) -> Result<(), LibraryError> {
        let existing = self
            .store
            .get_review(review_id)?
            .ok_or(LibraryError::NotFound("review"))?;
        if existing.user_id != user_id {
            return Err(LibraryError::Forbidden);
        }
        self.store.delete_review(review_id)?;
        Ok(())
    }

    pub fn reviews_for_album(&self, album_id: &str) -> Result<Vec<Review>, LibraryError> {
        Ok(self.store.list_reviews_for_album(album_id)?)
    }

    pub fn reviews_for_user(&self, user_id: usize) -> Result<Vec<Review>, LibraryError> {
        self.require_user(user_id)?;
        Ok(self.store.list_reviews_for_user(user_id)?)
    }

    pub fn average_rating(&self, album_id: &str) -> Result<Option<f64>, LibraryError> {
        Ok(self.store.average_rating(album_id)?)
    }
}
