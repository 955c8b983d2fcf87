use anyhow::Context;

use reelpipe_api::app::{AppServices, build_app};
use reelpipe_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reelpipe_observability::init();

    let config = ApiConfig::from_env()?;
    let services = AppServices::new(&config);
    let app = build_app(&config, &services)?;

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Example app listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("shutdown signal received");
}
