//! Research Kernel schema bootstrap
//!
//! Connects with the configured database settings and creates every table,
//! index and constraint that does not exist yet. Safe to run repeatedly.

use anyhow::Context;
use research_kernel_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{schema, DbPool},
    metrics, VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting Research Kernel bootstrap v{}", VERSION
    );

    metrics::register_metrics();

    let pool = DbPool::new(&config.database)
        .await
        .context("failed to connect to database")?;
    pool.ping().await.context("database ping failed")?;

    schema::create_all(pool.conn())
        .await
        .context("failed to create schema")?;

    info!("Bootstrap complete");
    Ok(())
}
