//! remotecld - the remotecl server daemon.
//!
//! Accepts client connections and re-issues their remoted calls against
//! the native backend this binary was built with.

mod backend;

use clap::Parser;
use remotecl_server::{Server, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "remotecld")]
#[command(about = "remotecl server daemon")]
#[command(version)]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = remotecl_protocol::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::default().with_port(cli.port);
    tracing::info!(port = cli.port, "starting remotecl server");

    let server = Arc::new(Server::new(config, backend::NullBackend::default()));

    let shutdown_server = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("received shutdown signal, stopping server");
        shutdown_server.shutdown();
    });

    server.run().await?;
    tracing::info!("server stopped");
    Ok(())
}
