use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use prom_storage_adapter::args::Args;
use prom_storage_adapter::logging::init_logging;
use prom_storage_adapter::{build_writer, server};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = args.load_config()?;
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    let writer = Arc::new(build_writer(&config)?);
    let listen_addr = config.listen_addr()?;
    let listener = TcpListener::bind(&listen_addr).await?;
    info!(
        "Prometheus storage adapter {} listening on {}",
        env!("CARGO_PKG_VERSION"),
        listen_addr
    );

    tokio::select! {
        result = server::serve(listener, writer.clone()) => result?,
        _ = shutdown_signal() => info!("Shutdown signal received"),
    }

    if let Err(e) = writer.flush().await {
        warn!("Failed to flush pending metrics: {}", e);
    }
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
