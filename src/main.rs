use anyhow::{Context, Result};
use site_content::cms::{CmsClient, ContentFetcher};
use site_content::config::Config;
use site_content::server::{build_router, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_content=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Starting site content server (CMS: {}, dataset: {})",
        config.cms_api_url, config.cms_dataset
    );

    let fetcher: Arc<dyn ContentFetcher> = Arc::new(CmsClient::from_config(&config)?);
    let port = config.port;
    let app = build_router(AppState::new(config, fetcher));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("✓ Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
