//! Lockstep participant server.
//!
//! Runs one participant process: an HTTP surface over a fresh in-memory
//! state store, reading samples from an input directory and writing the
//! global result to an output directory. Role and roster arrive later via
//! the setup call.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lockstep_compute::{DirIo, MeanComputation};
use lockstep_node::Node;
use lockstep_server::participant_router;
use lockstep_store::MemoryStore;

#[derive(Parser)]
#[command(name = "lockstep-server")]
#[command(about = "Lockstep participant server")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:9000")]
    listen: SocketAddr,

    /// Directory holding the input sample files
    #[arg(long, default_value = "/mnt/input")]
    input_dir: PathBuf,

    /// Directory the global result is written to
    #[arg(long, default_value = "/mnt/output")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let node = Arc::new(Mutex::new(Node::new(
        MemoryStore::new(),
        MeanComputation,
        DirIo::new(cli.input_dir, cli.output_dir),
    )));
    let app = participant_router(node);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(listen = %cli.listen, "Lockstep participant listening");
    axum::serve(listener, app).await?;

    Ok(())
}
