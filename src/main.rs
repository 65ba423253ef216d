use anyhow::Result;
use std::{io::ErrorKind, sync::Arc};
use surgery_video::{
    AppState,
    config::{AppConfig, SiteConfig},
    routes,
    services::{
        session_service::{AnonymousOnly, JwtSessionProvider, SessionProvider},
        storage_service::StorageService,
    },
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config (missing credentials end the process here) ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!(
        addr = %cfg.addr(),
        storage = ?cfg.storage,
        bucket = %cfg.bucket,
        region = %cfg.region,
        site_url = %cfg.site_url,
        sessions = cfg.session_secret.is_some(),
        "Starting surgery-video"
    );

    // --- Initialize storage gateway ---
    let storage = StorageService::from_config(&cfg)?;
    tracing::info!(bucket = %storage.bucket(), "storage gateway ready");

    // --- Session provider ---
    let sessions: Arc<dyn SessionProvider> = match cfg.session_secret.as_deref() {
        Some(secret) => Arc::new(JwtSessionProvider::new(secret)),
        None => {
            tracing::warn!("NEXTAUTH_SECRET not set; every request is treated as signed out");
            Arc::new(AnonymousOnly)
        }
    };

    let site = SiteConfig::new(cfg.site_url.clone(), cfg.session_secret.is_some());
    let state = AppState::new(storage, sessions, site);

    // --- Build router ---
    let app = routes::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
