//! gridlock server binary.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store (records lost on restart)
//! gridlock-server --bind 127.0.0.1:4600
//!
//! # Durable redb store
//! gridlock-server --bind 0.0.0.0:4600 --store /var/lib/gridlock/gridlock.redb
//! ```

use std::path::PathBuf;

use clap::Parser;
use gridlock_server::{MemoryStore, RedbStore, Server, ServerConfig, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// gridlock match server
#[derive(Parser, Debug)]
#[command(name = "gridlock-server")]
#[command(about = "Turn-based match server with invites and presence")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:4600")]
    bind: String,

    /// Path to the redb database file (in-memory store when omitted)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("gridlock server starting");
    tracing::info!("binding to {}", args.bind);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        driver: ServerConfig { max_connections: args.max_connections },
    };

    match args.store {
        Some(path) => {
            tracing::info!("using redb store at {}", path.display());
            let store = RedbStore::open(&path)?;
            let server = Server::bind(store, config).await?;
            server.run().await?;
        },
        None => {
            tracing::warn!("no store path given - records will not survive a restart");
            let server = Server::bind(MemoryStore::new(), config).await?;
            server.run().await?;
        },
    }

    Ok(())
}
