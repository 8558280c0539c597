#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Mail spool server

use clap::Parser;
use mailspool::{Server, ServerConfig};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailspool-server")]
#[command(about = "Line-oriented store-and-forward mail server")]
struct Args {
    /// Port to listen on (default: `MAILSPOOL_PORT` or 6543)
    port: Option<u16>,

    /// Spool root directory (default: `MAILSPOOL_DIR`)
    spool_dir: Option<PathBuf>,

    /// Address to bind (default: `MAILSPOOL_HOST` or 127.0.0.1)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match args.spool_dir {
        Some(dir) => ServerConfig::from_env_with_spool(dir)?,
        None => ServerConfig::from_env()?,
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    let server = Server::bind(&config).await?;
    println!("mailspool listening on {}", server.local_addr()?);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            return;
        }
        info!("Shutdown requested");
        on_signal.cancel();
    });

    server.run(cancel).await?;
    Ok(())
}
