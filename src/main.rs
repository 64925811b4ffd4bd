//! Ban gate (v1)
//!
//! Sits in front of one upstream and rejects requests whose
//! `X-Forwarded-For` chain contains a banned address.
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────┐
//!     ────────────────────┼─▶ request id → trace → timeout           │
//!                         │        │                                 │
//!                         │        ▼                                 │
//!                         │   ban filter ──(banned / no XFF)──▶ 403  │
//!                         │        │                                 │
//!                         │        ▼                                 │
//!     Client Response     │   forward handler ─────────────────────┼──▶ Upstream
//!     ◀───────────────────┼────────────────────────────────────────┼─── Server
//!                         │                                          │
//!                         │   ban sweeper (optional, periodic)       │
//!                         └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ban_gate::config::validation::validate_config;
use ban_gate::config::{load_config, malformed_bans, ConfigError, GateConfig};
use ban_gate::lifecycle::{shutdown_signal, Shutdown};
use ban_gate::observability::{logging, metrics};
use ban_gate::HttpServer;

#[derive(Parser)]
#[command(name = "ban-gate")]
#[command(about = "Reject requests from banned X-Forwarded-For addresses", long_about = None)]
struct Cli {
    /// Config file (TOML, or JSON when the name ends in .json).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<GateConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability);

    tracing::info!("ban-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = ?cli.config,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let malformed = malformed_bans(&config);
    if malformed > 0 {
        tracing::warn!(
            filter = %config.ban_filter.name,
            malformed,
            "Some ban timestamps are not RFC3339; they will be dropped when first seen"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
