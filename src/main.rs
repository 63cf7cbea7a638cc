//! kraken_dca - one run per invocation
//!
//! Started by an external scheduler (cron, systemd timer, ...). Exits 0
//! when the order was placed or skipped, 1 otherwise.

use chrono::Utc;
use kraken_dca::{build_http_client, DcaConfig, DcaRunner, OrderOutcome, WallClockNonce};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Kraken DCA run triggered at: {}", Utc::now());

    match run().await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<OrderOutcome, Box<dyn std::error::Error>> {
    let config = DcaConfig::from_env()?;
    let client = build_http_client(config.http_timeout)?;
    let runner = DcaRunner::new(client, &config.api_url, Arc::new(WallClockNonce));
    Ok(runner.run(&config).await?)
}
