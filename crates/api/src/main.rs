use std::sync::Arc;

use anyhow::Context;

use stockforge_api::app::{build_app, services::AppServices};
use stockforge_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("reading configuration")?;
    stockforge_observability::init(&config.log);

    if config.data_dir.is_none() {
        tracing::warn!("STOCKFORGE_DATA_DIR not set; state is kept in memory only");
    }

    let services = AppServices::build(&config).context("opening warehouse")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
