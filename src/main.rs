//! bootbucket CLI
//!
//! Offline tooling for bucket names, bucket policies and Ignition user data.

use clap::Parser;

use bootbucket::{Cli, Result};
use bootbucket_common::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(TelemetryConfig::from_env()?)?;

    let cli = Cli::parse();
    cli.run().await
}
