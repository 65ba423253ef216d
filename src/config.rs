use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::{env, fmt, time::Duration};

/// Upload ceiling advertised to clients and enforced while streaming (2 GiB).
pub const MAX_VIDEO_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Advertised duration ceiling in seconds. Never measured.
pub const MAX_VIDEO_DURATION_SECS: u64 = 3600;

/// MIME types accepted by the upload flow.
pub const ALLOWED_VIDEO_TYPES: [&str; 3] = ["video/mp4", "video/webm", "video/quicktime"];

/// Which object store the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendKind {
    /// Amazon S3 or an S3-compatible endpoint.
    S3,
    /// Process-local store, for development without a bucket.
    Memory,
}

impl StorageBackendKind {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown storage backend `{}` (expected `s3` or `memory`)", other),
        }
    }
}

/// Access key pair for the bucket.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackendKind,
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub credentials: Option<AwsCredentials>,
    pub site_url: String,
    pub session_secret: Option<String>,
    pub presign_ttl: Option<Duration>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Surgical training video catalog service")]
pub struct Args {
    /// Host to bind to (overrides SURGERY_VIDEO_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SURGERY_VIDEO_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend (overrides SURGERY_VIDEO_STORAGE)
    #[arg(long, value_enum)]
    pub storage: Option<StorageBackendKind>,

    /// Bucket holding the videos (overrides AWS_S3_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// S3-compatible endpoint, e.g. http://localhost:9000 (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Public base URL of the site (overrides NEXTAUTH_URL)
    #[arg(long)]
    pub site_url: Option<String>,

    /// Lifetime of presigned video URLs in seconds (overrides SURGERY_VIDEO_PRESIGN_TTL)
    #[arg(long)]
    pub presign_ttl: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_sources(args, |name| env::var(name).ok())
    }

    /// Merge parsed arguments over an environment lookup.
    ///
    /// Missing credentials are fatal for the S3 backend.
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_port = match lookup("SURGERY_VIDEO_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing SURGERY_VIDEO_PORT value `{}`", value))?,
            None => 8000,
        };
        let env_storage = match lookup("SURGERY_VIDEO_STORAGE") {
            Some(value) => StorageBackendKind::parse(&value)?,
            None => StorageBackendKind::S3,
        };
        let env_ttl = match lookup("SURGERY_VIDEO_PRESIGN_TTL") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .with_context(|| format!("parsing SURGERY_VIDEO_PRESIGN_TTL value `{}`", value))?,
            ),
            None => None,
        };

        let storage = args.storage.unwrap_or(env_storage);
        let credentials = match (
            lookup("AWS_ACCESS_KEY_ID").filter(|v| !v.is_empty()),
            lookup("AWS_SECRET_ACCESS_KEY").filter(|v| !v.is_empty()),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key,
            }),
            _ => None,
        };
        if storage == StorageBackendKind::S3 && credentials.is_none() {
            bail!("AWS credentials are not properly configured");
        }

        Ok(Self {
            host: args
                .host
                .or_else(|| lookup("SURGERY_VIDEO_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            storage,
            bucket: args
                .bucket
                .or_else(|| lookup("AWS_S3_BUCKET_NAME"))
                .unwrap_or_else(|| "surgery-app-videos".into()),
            region: args
                .region
                .or_else(|| lookup("AWS_REGION"))
                .unwrap_or_else(|| "eu-west-1".into()),
            endpoint_url: args.endpoint_url.or_else(|| lookup("AWS_ENDPOINT_URL")),
            credentials,
            site_url: args
                .site_url
                .or_else(|| lookup("NEXTAUTH_URL"))
                .unwrap_or_else(|| "http://localhost:8000".into()),
            session_secret: lookup("NEXTAUTH_SECRET").filter(|v| !v.is_empty()),
            presign_ttl: args.presign_ttl.or(env_ttl).map(Duration::from_secs),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Limits and formats applied to uploaded videos.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRules {
    pub max_size: u64,
    pub allowed_types: Vec<String>,
    pub max_duration: u64,
}

impl Default for VideoRules {
    fn default() -> Self {
        Self {
            max_size: MAX_VIDEO_SIZE,
            allowed_types: ALLOWED_VIDEO_TYPES.iter().map(|t| t.to_string()).collect(),
            max_duration: MAX_VIDEO_DURATION_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub authentication: bool,
    pub video_upload: bool,
    pub video_playback: bool,
    pub favorites: bool,
    pub passthrough: bool,
}

/// Public description of the site, served at `/api/site`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
    pub url: String,
    pub video_config: VideoRules,
    pub features: Features,
}

impl SiteConfig {
    pub fn new(url: impl Into<String>, authentication: bool) -> Self {
        Self {
            name: "Surgery App".into(),
            description: "A modern platform for surgical video management and training".into(),
            url: url.into(),
            video_config: VideoRules::default(),
            features: Features {
                authentication,
                video_upload: true,
                video_playback: true,
                favorites: true,
                passthrough: true,
            },
        }
    }
}
