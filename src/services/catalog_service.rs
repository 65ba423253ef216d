//! Catalog view: a display projection of the gateway's list result.
//!
//! No sorting is imposed; entries keep the store's listing order. A failed
//! listing is its own state, distinct from an empty catalog.

use crate::{
    format::{format_date, format_file_size, format_short_date},
    models::video::VideoObject,
    services::storage_service::StorageError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const EMPTY_CATALOG_MESSAGE: &str = "No videos available";

/// One displayable catalog row.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub key: String,
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    /// Gallery label, `10/18/2026`.
    pub formatted_date: String,
    /// Detail label, `October 18, 2026`.
    pub formatted_long_date: String,
    pub formatted_size: String,
}

impl From<VideoObject> for VideoEntry {
    fn from(video: VideoObject) -> Self {
        Self {
            formatted_date: format_short_date(&video.last_modified),
            formatted_long_date: format_date(&video.last_modified),
            formatted_size: format_file_size(video.size),
            key: video.key,
            url: video.url,
            last_modified: video.last_modified,
            size: video.size,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatalogView {
    Populated { videos: Vec<VideoEntry> },
    Empty { message: String },
    Failed { error: String },
}

impl CatalogView {
    pub fn from_videos(videos: Vec<VideoObject>) -> Self {
        if videos.is_empty() {
            return CatalogView::Empty {
                message: EMPTY_CATALOG_MESSAGE.to_string(),
            };
        }
        CatalogView::Populated {
            videos: videos.into_iter().map(VideoEntry::from).collect(),
        }
    }

    pub fn from_result(result: Result<Vec<VideoObject>, StorageError>) -> Self {
        match result {
            Ok(videos) => Self::from_videos(videos),
            Err(err) => CatalogView::Failed {
                error: err.to_string(),
            },
        }
    }

    pub fn entries(&self) -> &[VideoEntry] {
        match self {
            CatalogView::Populated { videos } => videos,
            _ => &[],
        }
    }

    /// Drop the entry with exactly this key after a successful delete.
    ///
    /// Returns whether an entry was removed. Removing the last entry turns the
    /// view empty.
    pub fn remove(&mut self, key: &str) -> bool {
        let CatalogView::Populated { videos } = self else {
            return false;
        };
        let before = videos.len();
        videos.retain(|video| video.key != key);
        let removed = videos.len() != before;
        if videos.is_empty() {
            *self = CatalogView::Empty {
                message: EMPTY_CATALOG_MESSAGE.to_string(),
            };
        }
        removed
    }
}
