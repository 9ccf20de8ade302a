//! API gateway entry point.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::{self, GatewayConfig};
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::{signals, Shutdown};
use api_gateway::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "api-gateway", about = "Authenticated reverse proxy for the platform services")]
struct Args {
    /// Path to the gateway configuration file (TOML). Defaults plus
    /// environment overrides are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: GatewayConfig = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_default()?,
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        trust_proxy = config.listener.trust_proxy,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    let server = HttpServer::new(config);
    for route in server.routes().routes() {
        tracing::info!(
            prefix = route.prefix(),
            upstream = %route.upstream,
            auth_required = route.auth_required,
            "Route registered"
        );
    }

    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
