//! Upload flow: file validation, the Idle -> FileSelected -> Uploading state
//! machine, and byte-driven progress.
//!
//! Progress is computed from bytes actually received. It is held at
//! [`PENDING_CEILING`] until the storage write resolves, reaches 100 only on
//! success, and is `Indeterminate` when the total size is unknown.

use crate::{
    config::VideoRules,
    models::video::UploadedVideo,
    services::storage_service::StorageResult,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Highest percentage reported before the storage call resolves.
pub const PENDING_CEILING: u8 = 95;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("unsupported video type `{0}`; use MP4, WebM, or MOV")]
    UnsupportedType(String),
    #[error("video exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("no file selected")]
    NoFileSelected,
    #[error("an upload is already in progress")]
    Busy,
}

/// Whether `content_type` is one of the accepted video MIME types.
pub fn is_valid_video_file(rules: &VideoRules, content_type: &str) -> bool {
    rules.allowed_types.iter().any(|t| t == content_type)
}

/// A selected local file. Transient: discarded on success, failure, or clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDraft {
    pub file_name: String,
    pub content_type: String,
    /// File size declared by the client. Checked against the ceiling up front.
    pub declared_size: Option<u64>,
    /// Length of the whole request, multipart framing included. Only used to
    /// estimate progress when no file size was declared.
    pub request_length: Option<u64>,
}

impl UploadDraft {
    /// Denominator for progress, if any total is known.
    fn progress_total(&self) -> Option<u64> {
        self.declared_size.or(self.request_length)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum UploadProgress {
    Indeterminate,
    Percent(u8),
}

impl UploadProgress {
    pub fn percent(&self) -> Option<u8> {
        match self {
            UploadProgress::Indeterminate => None,
            UploadProgress::Percent(p) => Some(*p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    FileSelected(UploadDraft),
    Uploading { draft: UploadDraft, bytes_sent: u64 },
}

/// State machine for one upload.
///
/// Progress is published on a watch channel so other tasks can observe it
/// without touching the flow.
#[derive(Debug)]
pub struct UploadFlow {
    rules: VideoRules,
    state: UploadState,
    progress: watch::Sender<UploadProgress>,
}

impl UploadFlow {
    pub fn new(rules: VideoRules) -> Self {
        let (progress, _) = watch::channel(UploadProgress::Percent(0));
        Self {
            rules,
            state: UploadState::Idle,
            progress,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn progress(&self) -> UploadProgress {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    /// Choose a file. An unsupported type leaves the current state untouched.
    pub fn select_file(&mut self, draft: UploadDraft) -> Result<(), UploadError> {
        if matches!(self.state, UploadState::Uploading { .. }) {
            return Err(UploadError::Busy);
        }
        if !is_valid_video_file(&self.rules, &draft.content_type) {
            debug!(content_type = %draft.content_type, "ignoring unsupported file");
            return Err(UploadError::UnsupportedType(draft.content_type));
        }
        if let Some(size) = draft.declared_size {
            if size > self.rules.max_size {
                return Err(UploadError::TooLarge {
                    limit: self.rules.max_size,
                });
            }
        }
        debug!(file_name = %draft.file_name, "file selected");
        self.state = UploadState::FileSelected(draft);
        Ok(())
    }

    /// Drop the selection. Not allowed mid-upload.
    pub fn clear(&mut self) -> Result<(), UploadError> {
        if matches!(self.state, UploadState::Uploading { .. }) {
            return Err(UploadError::Busy);
        }
        self.state = UploadState::Idle;
        Ok(())
    }

    /// Start uploading the selected file.
    pub fn begin(&mut self) -> Result<(), UploadError> {
        let draft = match std::mem::replace(&mut self.state, UploadState::Idle) {
            UploadState::FileSelected(draft) => draft,
            UploadState::Idle => return Err(UploadError::NoFileSelected),
            uploading @ UploadState::Uploading { .. } => {
                self.state = uploading;
                return Err(UploadError::Busy);
            }
        };

        let initial = match draft.progress_total() {
            Some(_) => UploadProgress::Percent(0),
            None => UploadProgress::Indeterminate,
        };
        self.progress.send_replace(initial);
        info!(file_name = %draft.file_name, content_type = %draft.content_type, "upload started");

        self.state = UploadState::Uploading {
            draft,
            bytes_sent: 0,
        };
        Ok(())
    }

    /// Account for `len` more bytes received.
    ///
    /// Fails once the running total passes the size ceiling.
    pub fn record_bytes(&mut self, len: u64) -> Result<UploadProgress, UploadError> {
        let UploadState::Uploading { draft, bytes_sent } = &mut self.state else {
            return Err(UploadError::NoFileSelected);
        };
        *bytes_sent += len;
        if *bytes_sent > self.rules.max_size {
            warn!(bytes_sent = *bytes_sent, limit = self.rules.max_size, "upload over size limit");
            return Err(UploadError::TooLarge {
                limit: self.rules.max_size,
            });
        }

        let progress = match draft.progress_total() {
            Some(total) if total > 0 => {
                let pct = (u128::from(*bytes_sent) * 100 / u128::from(total)) as u64;
                UploadProgress::Percent(pct.min(u64::from(PENDING_CEILING)) as u8)
            }
            Some(_) => UploadProgress::Percent(PENDING_CEILING),
            None => UploadProgress::Indeterminate,
        };
        self.progress.send_replace(progress);
        Ok(progress)
    }

    /// Resolve the upload with the storage result and return to Idle.
    ///
    /// Success reports exactly 100 before the reset; failure resets progress
    /// to 0. The file selection is discarded either way.
    pub fn complete(&mut self, result: &StorageResult<UploadedVideo>) -> UploadProgress {
        let final_progress = match result {
            Ok(uploaded) => {
                info!(key = %uploaded.key, size_bytes = uploaded.size, "upload complete");
                UploadProgress::Percent(100)
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                UploadProgress::Percent(0)
            }
        };
        self.progress.send_replace(final_progress);
        self.state = UploadState::Idle;
        final_progress
    }
}

/// In-flight uploads that clients may poll, keyed by a client-chosen id.
///
/// The lock is never held across an await, so entries can be removed from
/// `Drop` when a request is abandoned mid-stream.
#[derive(Clone, Default)]
pub struct UploadTracker {
    inner: Arc<RwLock<HashMap<Uuid, watch::Receiver<UploadProgress>>>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow's progress under `id`. Fails if the id is taken.
    ///
    /// The entry lives as long as the returned [`TrackedUpload`].
    pub fn register(
        &self,
        id: Uuid,
        progress: watch::Receiver<UploadProgress>,
    ) -> Result<TrackedUpload, UploadError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.contains_key(&id) {
            return Err(UploadError::Busy);
        }
        guard.insert(id, progress);
        Ok(TrackedUpload {
            tracker: self.clone(),
            id,
        })
    }

    pub fn snapshot(&self, id: &Uuid) -> Option<UploadProgress> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|rx| *rx.borrow())
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: &Uuid) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

/// Registration handle for one tracked upload. Dropping it, including when
/// the client disconnects and the request future is dropped, removes the entry.
pub struct TrackedUpload {
    tracker: UploadTracker,
    id: Uuid,
}

impl Drop for TrackedUpload {
    fn drop(&mut self) {
        self.tracker.remove(&self.id);
        debug!(upload_id = %self.id, "upload no longer tracked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage_service::StorageError;

    fn draft(content_type: &str, size: Option<u64>) -> UploadDraft {
        UploadDraft {
            file_name: "hernia-repair.mp4".into(),
            content_type: content_type.into(),
            declared_size: size,
            request_length: None,
        }
    }

    fn uploaded() -> UploadedVideo {
        UploadedVideo {
            key: "videos/1-hernia-repair.mp4".into(),
            url: "https://s3.eu-west-1.amazonaws.com/b/videos/1-hernia-repair.mp4".into(),
            size: 1000,
        }
    }

    #[test]
    fn accepts_exactly_three_types() {
        let rules = VideoRules::default();
        for ok in ["video/mp4", "video/webm", "video/quicktime"] {
            assert!(is_valid_video_file(&rules, ok), "{ok}");
        }
        for bad in [
            "video/x-msvideo",
            "video/ogg",
            "video/MP4",
            "image/png",
            "application/octet-stream",
            "",
        ] {
            assert!(!is_valid_video_file(&rules, bad), "{bad}");
        }
    }

    #[test]
    fn invalid_type_leaves_state_unchanged() {
        let mut flow = UploadFlow::new(VideoRules::default());
        assert!(matches!(
            flow.select_file(draft("image/gif", None)),
            Err(UploadError::UnsupportedType(_))
        ));
        assert_eq!(flow.state(), &UploadState::Idle);

        flow.select_file(draft("video/mp4", None)).unwrap();
        let _ = flow.select_file(draft("text/plain", None));
        assert!(matches!(flow.state(), UploadState::FileSelected(_)));
    }

    #[test]
    fn begin_requires_a_file() {
        let mut flow = UploadFlow::new(VideoRules::default());
        assert_eq!(flow.begin().unwrap_err(), UploadError::NoFileSelected);
    }

    #[test]
    fn progress_is_held_below_ceiling_until_resolved() {
        let mut flow = UploadFlow::new(VideoRules::default());
        flow.select_file(draft("video/mp4", Some(1000))).unwrap();
        flow.begin().unwrap();
        assert_eq!(flow.progress(), UploadProgress::Percent(0));

        let mut seen = Vec::new();
        for _ in 0..10 {
            seen.push(flow.record_bytes(100).unwrap());
        }
        assert!(seen.iter().all(|p| p.percent().unwrap() <= PENDING_CEILING));
        assert_eq!(seen[4], UploadProgress::Percent(50));
        assert_eq!(flow.progress(), UploadProgress::Percent(95));

        let done = flow.complete(&Ok(uploaded()));
        assert_eq!(done, UploadProgress::Percent(100));
        assert_eq!(flow.progress(), UploadProgress::Percent(100));
        assert_eq!(flow.state(), &UploadState::Idle);
    }

    #[test]
    fn undercounted_total_still_caps_at_ceiling() {
        let mut flow = UploadFlow::new(VideoRules::default());
        flow.select_file(draft("video/webm", Some(10))).unwrap();
        flow.begin().unwrap();
        assert_eq!(flow.record_bytes(500).unwrap(), UploadProgress::Percent(95));
    }

    #[test]
    fn unknown_total_is_indeterminate() {
        let mut flow = UploadFlow::new(VideoRules::default());
        flow.select_file(draft("video/quicktime", None)).unwrap();
        flow.begin().unwrap();
        assert_eq!(flow.progress(), UploadProgress::Indeterminate);
        assert_eq!(flow.record_bytes(42).unwrap(), UploadProgress::Indeterminate);
    }

    #[test]
    fn failure_resets_and_discards_selection() {
        let mut flow = UploadFlow::new(VideoRules::default());
        let rx = flow.subscribe();
        flow.select_file(draft("video/mp4", Some(100))).unwrap();
        flow.begin().unwrap();
        flow.record_bytes(60).unwrap();
        assert_eq!(*rx.borrow(), UploadProgress::Percent(60));

        let err = Err(StorageError::NotFound("x".into()));
        assert_eq!(flow.complete(&err), UploadProgress::Percent(0));
        assert_eq!(flow.state(), &UploadState::Idle);
        assert_eq!(*rx.borrow(), UploadProgress::Percent(0));
    }

    #[test]
    fn size_ceiling_is_enforced_while_streaming() {
        let rules = VideoRules {
            max_size: 100,
            ..VideoRules::default()
        };
        let mut flow = UploadFlow::new(rules.clone());
        assert_eq!(
            flow.select_file(draft("video/mp4", Some(101))).unwrap_err(),
            UploadError::TooLarge { limit: 100 }
        );

        let mut flow = UploadFlow::new(rules);
        flow.select_file(draft("video/mp4", None)).unwrap();
        flow.begin().unwrap();
        flow.record_bytes(100).unwrap();
        assert_eq!(
            flow.record_bytes(1).unwrap_err(),
            UploadError::TooLarge { limit: 100 }
        );
    }

    #[test]
    fn cannot_clear_or_reselect_mid_upload() {
        let mut flow = UploadFlow::new(VideoRules::default());
        flow.select_file(draft("video/mp4", None)).unwrap();
        flow.begin().unwrap();
        assert_eq!(flow.clear().unwrap_err(), UploadError::Busy);
        assert_eq!(
            flow.select_file(draft("video/mp4", None)).unwrap_err(),
            UploadError::Busy
        );
        assert_eq!(flow.begin().unwrap_err(), UploadError::Busy);
    }

    #[test]
    fn progress_serializes_for_clients() {
        assert_eq!(
            serde_json::to_value(UploadProgress::Percent(40)).unwrap(),
            serde_json::json!({"kind": "percent", "percent": 40})
        );
        assert_eq!(
            serde_json::to_value(UploadProgress::Indeterminate).unwrap(),
            serde_json::json!({"kind": "indeterminate"})
        );
    }

    #[test]
    fn request_length_drives_progress_but_not_the_ceiling() {
        let rules = VideoRules {
            max_size: 100,
            ..VideoRules::default()
        };
        let mut flow = UploadFlow::new(rules);
        flow.select_file(UploadDraft {
            request_length: Some(200),
            ..draft("video/mp4", None)
        })
        .unwrap();
        flow.begin().unwrap();
        assert_eq!(flow.progress(), UploadProgress::Percent(0));
        assert_eq!(flow.record_bytes(100).unwrap(), UploadProgress::Percent(50));
        assert_eq!(
            flow.record_bytes(1).unwrap_err(),
            UploadError::TooLarge { limit: 100 }
        );
    }

    #[test]
    fn tracker_exposes_live_progress() {
        let tracker = UploadTracker::new();
        let mut flow = UploadFlow::new(VideoRules::default());
        let id = Uuid::new_v4();
        let tracked = tracker.register(id, flow.subscribe()).unwrap();
        assert_eq!(
            tracker.register(id, flow.subscribe()).err(),
            Some(UploadError::Busy)
        );

        flow.select_file(draft("video/mp4", Some(200))).unwrap();
        flow.begin().unwrap();
        flow.record_bytes(50).unwrap();
        assert_eq!(tracker.snapshot(&id), Some(UploadProgress::Percent(25)));

        drop(tracked);
        assert_eq!(tracker.snapshot(&id), None);
        assert!(tracker.is_empty());
        assert!(tracker.register(id, flow.subscribe()).is_ok());
    }
}
