//! Reshaped catalog types and the upstream wire format they come from.
//!
//! The upstream catalog speaks its own schema; everything leaving this
//! module is flattened down to what the frontend actually renders.

use serde::{Deserialize, Serialize};

/// A search hit: just enough to render a result tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub number: u32,
    pub title: String,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumDetail {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub cover_url: Option<String>,
    pub release_date: Option<String>,
    pub tracks: Vec<TrackEntry>,
}

// ---- upstream wire format ----

#[derive(Debug, Deserialize)]
pub(crate) struct WireSearchResponse {
    pub albums: WireAlbumPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAlbumPage {
    #[serde(default)]
    pub items: Vec<WireAlbum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<WireArtist>,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub tracks: Option<WireTrackPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTrackPage {
    #[serde(default)]
    pub items: Vec<WireTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTrack {
    pub name: String,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl WireAlbum {
    fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The first image is the largest one upstream offers.
    fn cover_url(&self) -> Option<String> {
        self.images.first().map(|image| image.url.clone())
    }

    pub(crate) fn to_summary(&self) -> AlbumSummary {
        AlbumSummary {
            id: self.id.clone(),
            title: self.name.clone(),
            artist: self.artist_names(),
            cover_url: self.cover_url(),
        }
    }

    pub(crate) fn into_detail(self) -> AlbumDetail {
        let summary = self.to_summary();
        let tracks = self
            .tracks
            .map(|page| {
                page.items
                    .into_iter()
                    .map(|track| TrackEntry {
                        number: track.track_number,
                        title: track.name,
                        duration_ms: track.duration_ms,
                    })
                    .collect()
            })
            .unwrap_or_default();
        AlbumDetail {
            id: summary.id,
            title: summary.title,
            artist: summary.artist,
            cover_url: summary.cover_url,
            release_date: self.release_date,
            tracks,
        }
    }
}
