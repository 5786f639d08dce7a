//! Flowboard task server -- canonical store for board clients.
//!
//! An axum REST server that holds the task set, recomputes fractional
//! positions for drag-and-drop moves, and serves plain or paginated
//! listings. Optionally seeds from and persists to a JSON data file.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:4000, in-memory only
//! cargo run --bin flowboard-server
//!
//! # Run on a custom address with a persistent board file
//! cargo run --bin flowboard-server -- --bind 127.0.0.1:8080 --data-file board.json
//!
//! # Or via environment variables
//! FLOWBOARD_ADDR=127.0.0.1:8080 FLOWBOARD_DATA=board.json cargo run --bin flowboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use flowboard_server::config::{ServerCliArgs, ServerConfig};
use flowboard_server::http;
use flowboard_server::store::BoardStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting flowboard task server");

    let store = match &config.data_file {
        Some(path) => Arc::new(BoardStore::with_data_file(path.clone())),
        None => Arc::new(BoardStore::new()),
    };
    match store.load().await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(count, "seeded board from data file");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load data file");
            std::process::exit(1);
        }
    }

    match http::start_server_with_state(&config.bind_addr, store).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task server");
            std::process::exit(1);
        }
    }
}
