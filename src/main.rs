use anyhow::Result;
use flock_core::{config::Config, policy, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    policy::table::validate_tables()?;

    info!("Starting Flock Core Service");
    info!(
        session_backend = ?config.session.backend,
        view_as_ttl_secs = ?config.view_as.ttl_secs,
        "Access control initialized"
    );

    // Run the server
    server::run(config, prometheus_handle).await
}
