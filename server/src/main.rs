//! `RoomBnB` HTTP server.

use roombnb_server::{Application, Config};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,roombnb=debug,sqlx=warn,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RoomBnB booking service");

    let config = Config::from_env();
    tracing::info!(
        address = %config.bind_address(),
        metrics = %config.metrics_address(),
        sweep_enabled = config.sweep.enabled,
        sweep_interval_secs = config.sweep.interval_secs,
        "Configuration loaded"
    );

    Application::build(config).await?.run().await
}
