//! Cluster query proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                 untrusted                    internal network
//!   Client ──▶ ┌────────────┐   POST      ┌────────────┐   ?query=   ┌────────────┐
//!              │ gatekeeper │ ──────────▶ │   relay    │ ──────────▶ │   router   │
//!              │ /validate  │  /process   │ /process   │ /{strategy} │ classify + │
//!              └────────────┘             └────────────┘             │  select    │
//!                                                                    └─────┬──────┘
//!                                                    writes, direct        │   reads (random/customized)
//!                                                  ┌───────────────────────┴───────────────┐
//!                                                  ▼                                       ▼
//!                                             ┌─────────┐                     ┌────────┐ ┌────────┐
//!                                             │ manager │ ── replication ──▶  │ worker │ │ worker │
//!                                             └─────────┘                     └────────┘ └────────┘
//! ```
//!
//! One process runs one tier, chosen on the command line.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cluster_proxy::config::{load_config, Tier};
use cluster_proxy::http::HttpServer;
use cluster_proxy::lifecycle::{signals, Shutdown};
use cluster_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cluster-proxy")]
#[command(about = "Gatekeeper, relay and router tiers for a replicated database cluster", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "cluster.toml")]
    config: PathBuf,

    /// Tier to run.
    #[arg(value_enum)]
    tier: Tier,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config, cli.tier)?;
    logging::init_logging(&config.observability);

    tracing::info!(
        tier = %cli.tier,
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "cluster-proxy v0.1.0 starting"
    );

    if config.trust.shared_token.is_none() && cli.tier != Tier::Gatekeeper {
        tracing::warn!("No shared token configured; tier access relies on network isolation");
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(cli.tier, config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&signal_shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
