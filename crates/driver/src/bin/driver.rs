//! Lockstep run driver CLI.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lockstep_driver::{Driver, DriverConfig};

#[derive(Parser)]
#[command(name = "lockstep-driver")]
#[command(about = "Polling driver for a lockstep federated run")]
#[command(version)]
struct Cli {
    /// Participant endpoints (comma-separated; the first coordinates)
    #[arg(short, long, value_delimiter = ',', required = true)]
    endpoints: Vec<String>,

    /// Delay between polling sweeps (e.g. "500ms", "2s")
    #[arg(long, default_value = "500ms")]
    poll_interval: humantime::Duration,

    /// Assume participants are already configured and skip the setup calls
    #[arg(long)]
    skip_setup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = DriverConfig::from_endpoints(cli.endpoints, *cli.poll_interval)?;
    let driver = Driver::new(config);

    if !cli.skip_setup {
        driver.setup_all().await?;
    }

    match driver.run().await? {
        Some(result) => info!(result, "Run complete"),
        None => info!("Run complete; result was distributed before this sweep"),
    }
    Ok(())
}
