//! Library data models: per-user album statuses, reviews and follow edges.

use serde::{Deserialize, Serialize};

/// Shelf an album sits on for a given user. The favorite flag lives next
/// to the status but is orthogonal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    #[serde(rename = "want-to-listen")]
    WantToListen,
    #[serde(rename = "listened")]
    Listened,
}

impl StatusKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StatusKind::WantToListen => "want-to-listen",
            StatusKind::Listened => "listened",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "want-to-listen" => Some(StatusKind::WantToListen),
            "listened" => Some(StatusKind::Listened),
            _ => None,
        }
    }
}

/// One row per (user, album); albums are referenced by their external
/// catalog id and never stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumStatus {
    pub id: usize,
    pub user_id: usize,
    pub album_id: String,
    pub status: StatusKind,
    pub is_favorite: bool,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: usize,
    pub user_id: usize,
    pub album_id: String,
    /// 1 to 5 in half-point steps; None means the review carries no rating.
    pub rating: Option<f64>,
    pub content: String,
    pub created: i64,
    pub updated: i64,
}

pub fn rating_is_valid(rating: f64) -> bool {
    (1.0..=5.0).contains(&rating) && (rating * 2.0).fract() == 0.0
}
