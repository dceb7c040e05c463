//! LinguaPulse payment webhook service.
//!
//! Receives payment-confirmation calls from the payment provider, extends the
//! user's weekly subscription, schedules the next lesson unlock and tells the
//! user through the Telegram bot.
//!
//! # Architecture Overview
//!
//! ```text
//!     Payment provider
//!     ────────────────▶ http::server ──▶ http::webhook ──▶ payments::processor
//!                                                             │
//!                         ┌───────────────┬─────────────────┼────────────────┐
//!                         ▼               ▼                 ▼                ▼
//!                   store (sqlx)   schedule (chrono)  telegram (reqwest)  funnel
//!
//!     Cross-cutting: config, observability (tracing, metrics), lifecycle, admin
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use linguapulse_payments::config::load_config;
use linguapulse_payments::http::HttpServer;
use linguapulse_payments::lifecycle::{build_processor, Shutdown};
use linguapulse_payments::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(author, version, about = "LinguaPulse payment webhook service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "LINGUAPULSE_CONFIG", default_value = "linguapulse.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "linguapulse-payments starting"
    );
    tracing::info!(
        bind_address = %config.server.bind_address,
        webhook_path = %config.server.webhook_path,
        utc_offset_minutes = config.schedule.utc_offset_minutes,
        funnel_enabled = config.funnel.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated as a socket address at load time.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let processor = build_processor(&config).await?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, Arc::new(processor));
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
