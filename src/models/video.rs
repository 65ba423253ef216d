//! Represents a video stored in the bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single video object under the `videos/` prefix.
///
/// The key is the sole identity used to correlate list and delete calls.
/// Objects are immutable between upload and delete.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoObject {
    /// Storage key, `videos/<unix-ms>-<filename>`.
    pub key: String,

    /// Public (path-style) URL of the object.
    pub url: String,

    /// Assigned by the store on write.
    pub last_modified: DateTime<Utc>,

    /// Size in bytes.
    pub size: u64,
}

/// Outcome of a successful upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadedVideo {
    pub key: String,
    pub url: String,
    pub size: u64,
}

/// A playable URL for a key. Presigned when the store can sign.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VideoUrl {
    pub key: String,
    pub url: String,
    pub presigned: bool,
}
