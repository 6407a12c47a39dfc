//! Threadchat server
//!
//! Entry point for the threaded agent chat UI.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use threadchat::config::AppConfig;
use threadchat::{server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads its env fallbacks
    let _ = dotenvy::dotenv();

    telemetry::init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::debug!(
        host = %config.server.host,
        port = config.server.port,
        runtime = config.agent.runtime.as_str(),
        "Configuration loaded"
    );

    server::start_server(Arc::new(config)).await
}
