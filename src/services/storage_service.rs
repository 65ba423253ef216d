//! src/services/storage_service.rs
//!
//! StorageService: the four video operations (put, list, delete, get-url)
//! against a bucket. The bucket is reached through `object_store`, so the
//! same gateway runs against S3 in production and an in-memory store in
//! development and tests. Every operation is a single stateless call; nothing
//! is retried, cached, or made transactional here.

use crate::{
    config::{AppConfig, StorageBackendKind},
    models::video::{UploadedVideo, VideoObject, VideoUrl},
};
use axum::http::Method;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, TryStreamExt, pin_mut};
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, aws::AmazonS3Builder, buffered::BufWriter,
    memory::InMemory, path::Path, signer::Signer,
};
use std::{fmt, io, sync::Arc, time::Duration, time::Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

/// Every video lives beneath this prefix.
pub const VIDEO_PREFIX: &str = "videos/";

const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Gateway operation, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Upload,
    List,
    Delete,
    GetUrl,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorageOp::Upload => "upload video",
            StorageOp::List => "list videos",
            StorageOp::Delete => "delete video",
            StorageOp::GetUrl => "get video URL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("invalid file name `{0}`")]
    InvalidFileName(String),
    #[error("video `{0}` not found")]
    NotFound(String),
    #[error("Failed to {op}")]
    Backend {
        op: StorageOp,
        #[source]
        source: object_store::Error,
    },
    #[error("Failed to {op}")]
    Transfer {
        op: StorageOp,
        #[source]
        source: io::Error,
    },
    #[error("upload body interrupted: {0}")]
    Body(#[source] io::Error),
    #[error("storage configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// StorageService provides the gateway operations:
/// - Upload a video (streams the body into `videos/<unix-ms>-<filename>`)
/// - List videos (every object under `videos/`, in store order)
/// - Delete a video (idempotent: a missing key is not an error)
/// - Resolve a playable URL (presigned when a signer is configured)
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
    presign_ttl: Option<Duration>,
    bucket: String,
    public_base: String,
}

impl fmt::Debug for StorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageService")
            .field("store", &self.store.to_string())
            .field("bucket", &self.bucket)
            .field("public_base", &self.public_base)
            .field("presign_ttl", &self.presign_ttl)
            .finish()
    }
}

impl StorageService {
    /// Wrap an existing store. `public_base` is the URL prefix objects are
    /// reachable under, without a trailing slash.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        public_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            signer: None,
            presign_ttl: None,
            bucket: bucket.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Sign `get_url` responses for `ttl` instead of returning public URLs.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>, ttl: Duration) -> Self {
        self.signer = Some(signer);
        self.presign_ttl = Some(ttl);
        self
    }

    /// Process-local store using the same URL shape as the S3 bucket.
    pub fn in_memory(bucket: &str, region: &str) -> Self {
        Self::new(
            Arc::new(InMemory::new()),
            bucket,
            public_base(bucket, region, None),
        )
    }

    /// Build the gateway selected by configuration.
    pub fn from_config(cfg: &AppConfig) -> StorageResult<Self> {
        match cfg.storage {
            StorageBackendKind::Memory => Ok(Self::in_memory(&cfg.bucket, &cfg.region)),
            StorageBackendKind::S3 => {
                let credentials = cfg.credentials.as_ref().ok_or_else(|| {
                    StorageError::Config("AWS credentials are not properly configured".into())
                })?;

                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(cfg.bucket.clone())
                    .with_region(cfg.region.clone())
                    .with_access_key_id(credentials.access_key_id.clone())
                    .with_secret_access_key(credentials.secret_access_key.clone())
                    .with_virtual_hosted_style_request(false);

                if let Some(endpoint) = cfg.endpoint_url.as_deref() {
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(endpoint.starts_with("http://"));
                }

                let s3 = Arc::new(
                    builder
                        .build()
                        .map_err(|e| StorageError::Config(e.to_string()))?,
                );
                let service = Self::new(
                    s3.clone(),
                    cfg.bucket.clone(),
                    public_base(&cfg.bucket, &cfg.region, cfg.endpoint_url.as_deref()),
                );

                Ok(match cfg.presign_ttl {
                    Some(ttl) => service.with_signer(s3, ttl),
                    None => service,
                })
            }
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Path-style public URL for a key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }

    /// Stream-upload a video.
    ///
    /// - Builds the key from the current time and the file's base name.
    /// - Stores the declared content type as an object attribute.
    /// - Returns the key, public URL, and number of bytes written.
    ///
    /// A failing body stream aborts the write and surfaces as `Body`.
    pub async fn upload_stream<S>(
        &self,
        file_name: &str,
        content_type: &str,
        stream: S,
    ) -> StorageResult<UploadedVideo>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        let key = video_key(file_name, Utc::now().timestamp_millis())?;
        let location = self.location(&key)?;
        let start = Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let mut writer =
            BufWriter::new(Arc::clone(&self.store), location).with_attributes(attributes);

        let mut size: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = writer.abort().await;
                    debug!(key = %key, error = %err, "upload body failed, write aborted");
                    return Err(StorageError::Body(err));
                }
            };
            size += chunk.len() as u64;
            if let Err(err) = writer.write_all(&chunk).await {
                let _ = writer.abort().await;
                return Err(self.transfer_failed(StorageOp::Upload, &key, start, err));
            }
        }

        if let Err(err) = writer.shutdown().await {
            return Err(self.transfer_failed(StorageOp::Upload, &key, start, err));
        }

        info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "video upload successful"
        );

        Ok(UploadedVideo {
            url: self.public_url(&key),
            key,
            size,
        })
    }

    /// Upload an in-memory body.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<UploadedVideo> {
        self.upload_stream(file_name, content_type, futures::stream::iter([Ok(data)]))
            .await
    }

    /// List every video under the prefix, in the store's listing order.
    pub async fn list(&self) -> StorageResult<Vec<VideoObject>> {
        let start = Instant::now();
        let prefix = Path::from(VIDEO_PREFIX.trim_end_matches('/'));

        let metas: Vec<ObjectMeta> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| self.backend_failed(StorageOp::List, VIDEO_PREFIX, start, e))?;

        debug!(
            bucket = %self.bucket,
            count = metas.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "listed videos"
        );

        Ok(metas
            .into_iter()
            .map(|meta| {
                let key = meta.location.to_string();
                VideoObject {
                    url: self.public_url(&key),
                    key,
                    last_modified: meta.last_modified,
                    size: meta.size as u64,
                }
            })
            .collect())
    }

    /// Remove a video. Deleting a key that does not exist succeeds.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = self.location(key)?;
        let start = Instant::now();

        match self.store.delete(&location).await {
            Ok(()) => {}
            Err(object_store::Error::NotFound { .. }) => {
                debug!(key = %key, "video already missing");
            }
            Err(e) => return Err(self.backend_failed(StorageOp::Delete, key, start, e)),
        }

        info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "video delete successful"
        );
        Ok(())
    }

    /// Resolve a playable URL for an existing key.
    pub async fn get_url(&self, key: &str) -> StorageResult<VideoUrl> {
        let location = self.location(key)?;
        let start = Instant::now();

        match self.store.head(&location).await {
            Ok(_) => {}
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(self.backend_failed(StorageOp::GetUrl, key, start, e)),
        }

        if let (Some(signer), Some(ttl)) = (&self.signer, self.presign_ttl) {
            let url = signer
                .signed_url(Method::GET, &location, ttl)
                .await
                .map_err(|e| self.backend_failed(StorageOp::GetUrl, key, start, e))?;
            return Ok(VideoUrl {
                key: key.to_string(),
                url: url.to_string(),
                presigned: true,
            });
        }

        Ok(VideoUrl {
            key: key.to_string(),
            url: self.public_url(key),
            presigned: false,
        })
    }

    /// Cheap reachability check for readiness probes.
    pub async fn probe(&self) -> StorageResult<()> {
        let start = Instant::now();
        let prefix = Path::from(VIDEO_PREFIX.trim_end_matches('/'));
        self.store
            .list_with_delimiter(Some(&prefix))
            .await
            .map(|_| ())
            .map_err(|e| self.backend_failed(StorageOp::List, VIDEO_PREFIX, start, e))
    }

    /// Validate a caller-supplied key and convert it to a store path.
    fn location(&self, key: &str) -> StorageResult<Path> {
        ensure_key_safe(key)?;
        Path::parse(key).map_err(|_| StorageError::InvalidObjectKey(key.to_string()))
    }

    fn backend_failed(
        &self,
        op: StorageOp,
        key: &str,
        start: Instant,
        source: object_store::Error,
    ) -> StorageError {
        error!(
            error = %source,
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "failed to {}", op
        );
        StorageError::Backend { op, source }
    }

    fn transfer_failed(
        &self,
        op: StorageOp,
        key: &str,
        start: Instant,
        source: io::Error,
    ) -> StorageError {
        error!(
            error = %source,
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "failed to {}", op
        );
        StorageError::Transfer { op, source }
    }
}

/// URL prefix for path-style addressing: `https://s3.<region>.amazonaws.com/<bucket>`,
/// or `<endpoint>/<bucket>` for S3-compatible providers.
pub fn public_base(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://s3.{}.amazonaws.com/{}", region, bucket),
    }
}

/// Build `videos/<unix-ms>-<filename>` from an uploaded file's name.
///
/// Only the base name is kept. Characters outside `[A-Za-z0-9._-]` become `_`
/// so the key survives listing unchanged.
pub fn video_key(file_name: &str, unix_ms: i64) -> StorageResult<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(StorageError::InvalidFileName(file_name.to_string()));
    }

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let key = format!("{}{}-{}", VIDEO_PREFIX, unix_ms, sanitized);
    ensure_key_safe(&key)?;
    Ok(key)
}

/// Key validation: must sit under the video prefix, with no traversal or
/// control characters.
fn ensure_key_safe(key: &str) -> StorageResult<()> {
    let invalid = || StorageError::InvalidObjectKey(key.to_string());
    if key.len() > MAX_OBJECT_KEY_LEN || !key.starts_with(VIDEO_PREFIX) {
        return Err(invalid());
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\')
    {
        return Err(invalid());
    }
    Ok(())
}
