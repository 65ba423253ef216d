//! Headset catalog: Idle -> Loading -> Populated.
//!
//! A refresh while one is already running is skipped, not queued. The
//! loading flag is an atomic so the catalog can be shared with a host task.

use super::video_type::VideoType;
use crate::{
    format::format_general_date,
    models::video::VideoObject,
    services::storage_service::{StorageError, StorageService, VIDEO_PREFIX},
};
use async_trait::async_trait;
use serde::Serialize;
use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::RwLock;
use tracing::{error, info};

pub const LOADING_STATUS: &str = "Loading videos...";

/// Where the headset gets its catalog and playable URLs.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn list_videos(&self) -> Result<Vec<VideoObject>, StorageError>;
    async fn video_url(&self, key: &str) -> Result<String, StorageError>;
}

#[async_trait]
impl VideoSource for StorageService {
    async fn list_videos(&self) -> Result<Vec<VideoObject>, StorageError> {
        self.list().await
    }

    async fn video_url(&self, key: &str) -> Result<String, StorageError> {
        Ok(self.get_url(key).await?.url)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VrVideoItem {
    pub key: String,
    pub title: String,
    pub date_label: String,
    pub video_type: VideoType,
}

impl From<&VideoObject> for VrVideoItem {
    fn from(video: &VideoObject) -> Self {
        let name = file_name(&video.key);
        VrVideoItem {
            key: video.key.clone(),
            title: Path::new(name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name)
                .to_string(),
            date_label: format_general_date(&video.last_modified),
            video_type: VideoType::classify(name),
        }
    }
}

/// The uploaded file name: the key without the prefix and the
/// `<unix-ms>-` stamp.
pub fn file_name(key: &str) -> &str {
    let base = key.strip_prefix(VIDEO_PREFIX).unwrap_or(key);
    match base.split_once('-') {
        Some((stamp, rest)) if !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => base,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogPhase {
    #[default]
    Idle,
    Loading,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was running.
    Skipped,
    Loaded(usize),
    Failed(String),
}

#[derive(Debug, Default)]
struct CatalogInner {
    phase: CatalogPhase,
    items: Vec<VrVideoItem>,
    status: String,
}

/// A selected item resolved for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrSelection {
    pub title: String,
    pub url: String,
    pub video_type: VideoType,
}

pub struct VrCatalog<S> {
    source: S,
    loading: AtomicBool,
    inner: RwLock<CatalogInner>,
}

/// Clears the loading flag however the refresh ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: VideoSource> VrCatalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            loading: AtomicBool::new(false),
            inner: RwLock::new(CatalogInner::default()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn phase(&self) -> CatalogPhase {
        self.inner.read().await.phase
    }

    pub async fn items(&self) -> Vec<VrVideoItem> {
        self.inner.read().await.items.clone()
    }

    pub async fn status(&self) -> String {
        self.inner.read().await.status.clone()
    }

    pub async fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message, "vr catalog status");
        self.inner.write().await.status = message;
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return RefreshOutcome::Skipped;
        }
        let _guard = LoadingGuard(&self.loading);

        {
            let mut inner = self.inner.write().await;
            inner.phase = CatalogPhase::Loading;
            inner.items.clear();
        }
        self.set_status(LOADING_STATUS).await;

        match self.source.list_videos().await {
            Ok(videos) => {
                let items: Vec<VrVideoItem> = videos.iter().map(VrVideoItem::from).collect();
                let count = items.len();
                {
                    let mut inner = self.inner.write().await;
                    inner.items = items;
                    inner.phase = CatalogPhase::Populated;
                }
                self.set_status(format!("Found {} videos", count)).await;
                RefreshOutcome::Loaded(count)
            }
            Err(e) => {
                error!(error = %e, "failed to refresh vr catalog");
                self.inner.write().await.phase = CatalogPhase::Idle;
                let message = e.to_string();
                self.set_status(format!("Error: {}", message)).await;
                RefreshOutcome::Failed(message)
            }
        }
    }

    /// Resolve a listed item for playback.
    pub async fn select(&self, key: &str) -> Result<VrSelection, StorageError> {
        let item = self
            .inner
            .read()
            .await
            .items
            .iter()
            .find(|item| item.key == key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        self.set_status(format!("Loading video: {}", item.title)).await;
        let url = self.source.video_url(key).await?;
        Ok(VrSelection {
            title: item.title,
            url,
            video_type: item.video_type,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tokio::sync::Notify;

    pub(crate) fn video(key: &str) -> VideoObject {
        VideoObject {
            key: key.to_string(),
            url: format!("https://s3.eu-west-1.amazonaws.com/bucket/{}", key),
            last_modified: Utc.with_ymd_and_hms(2026, 10, 18, 15, 4, 0).unwrap(),
            size: 1024,
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub videos: Vec<VideoObject>,
        pub fail: bool,
        pub calls: AtomicUsize,
        pub gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn list_videos(&self) -> Result<Vec<VideoObject>, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(StorageError::Config("bucket unreachable".into()));
            }
            Ok(self.videos.clone())
        }

        async fn video_url(&self, key: &str) -> Result<String, StorageError> {
            self.videos
                .iter()
                .find(|v| v.key == key)
                .map(|v| v.url.clone())
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        }
    }

    #[test]
    fn items_strip_stamp_and_classify_by_name() {
        let item = VrVideoItem::from(&video("videos/1736012345678-or_tour.mp4"));
        assert_eq!(item.title, "or_tour");
        assert_eq!(item.video_type, VideoType::Flat);
        assert_eq!(item.date_label, "10/18/2026 3:04 PM");

        let item = VrVideoItem::from(&video("videos/1700000000000-knee_360_3d.mp4"));
        assert_eq!(item.video_type, VideoType::Spherical360Stereo);
    }

    #[test]
    fn file_name_keeps_unstamped_names() {
        assert_eq!(file_name("videos/1700000000000-a-b.mp4"), "a-b.mp4");
        assert_eq!(file_name("videos/intro-clip.mp4"), "intro-clip.mp4");
        assert_eq!(file_name("loose.mp4"), "loose.mp4");
    }

    #[tokio::test]
    async fn refresh_populates_and_reports_count() {
        let catalog = VrCatalog::new(FakeSource {
            videos: vec![video("videos/1-a.mp4"), video("videos/2-b.mp4")],
            ..Default::default()
        });
        assert_eq!(catalog.phase().await, CatalogPhase::Idle);

        assert_eq!(catalog.refresh().await, RefreshOutcome::Loaded(2));
        assert_eq!(catalog.phase().await, CatalogPhase::Populated);
        assert_eq!(catalog.status().await, "Found 2 videos");
        assert_eq!(catalog.items().await.len(), 2);
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn failed_refresh_reports_error_and_releases_flag() {
        let catalog = VrCatalog::new(FakeSource {
            fail: true,
            ..Default::default()
        });
        let outcome = catalog.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        assert!(catalog.status().await.starts_with("Error: "));
        assert_eq!(catalog.phase().await, CatalogPhase::Idle);
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn overlapping_refresh_is_skipped() {
        let gate = Arc::new(Notify::new());
        let catalog = VrCatalog::new(FakeSource {
            videos: vec![video("videos/1-a.mp4")],
            gate: Some(gate.clone()),
            ..Default::default()
        });

        let first = catalog.refresh();
        let second = async {
            tokio::task::yield_now().await;
            assert!(catalog.is_loading());
            assert_eq!(catalog.status().await, LOADING_STATUS);
            let outcome = catalog.refresh().await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, RefreshOutcome::Loaded(1));
        assert_eq!(second, RefreshOutcome::Skipped);
        assert_eq!(catalog.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn select_resolves_url_and_type() {
        let catalog = VrCatalog::new(FakeSource {
            videos: vec![video("videos/1-hip_sbs.mp4")],
            ..Default::default()
        });
        catalog.refresh().await;

        let selection = catalog.select("videos/1-hip_sbs.mp4").await.unwrap();
        assert_eq!(selection.title, "hip_sbs");
        assert_eq!(selection.video_type, VideoType::SideBySide3D);
        assert!(selection.url.ends_with("videos/1-hip_sbs.mp4"));
        assert_eq!(catalog.status().await, "Loading video: hip_sbs");

        assert!(matches!(
            catalog.select("videos/missing.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
