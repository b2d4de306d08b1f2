//! Symptom relay — HTTP server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Build the relay pipeline (search, LLM, optional log store)
//!   5. Serve until Ctrl-C, then drain pending log writes

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use symptom_relay::error::AppError;
use symptom_relay::http::{self, HttpState};
use symptom_relay::relay::Relay;
use symptom_relay::{config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::parse_level(&config.log_level)?;
    logger::init(&config.log_level, false, None)?;

    info!(
        work_dir = %config.work_dir.display(),
        log_level = %config.log_level,
        bind = %config.relay.bind,
        "config loaded"
    );

    if config.search.provider == "serper" && config.search_api_key.is_none() {
        warn!("SEARCH_API_KEY is not set — requests will fail with a configuration error");
    }

    let relay = Arc::new(Relay::from_config(&config)?);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — shutting down");
            signal_token.cancel();
        }
    });

    let state = HttpState::new(
        Arc::clone(&relay),
        Duration::from_secs(config.relay.request_timeout_seconds),
    );
    http::run(config.relay.bind.clone(), config.relay.path.clone(), state, shutdown).await?;

    relay.flush_logs().await;
    Ok(())
}
