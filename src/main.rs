use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use clinic_gateway::config::{load_config, AppConfig};
use clinic_gateway::lifecycle::{signals, Services, Shutdown};
use clinic_gateway::observability::{logging, metrics};
use clinic_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "clinic-gateway")]
#[command(about = "Appointment booking API with per-caller admission control", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CLINIC_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("clinic-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = Services::from_config(&config)?;
    let server = HttpServer::from_config(&config, services)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
