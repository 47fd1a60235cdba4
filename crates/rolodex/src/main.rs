//! Rolodex operator CLI.
//!
//! Runs the batch jobs against the configured backends and ledger:
//! - Orphan discovery and import
//! - Backend migration and cleanup
//! - Hash backfill and deduplication

use clap::Parser;
use rolodex::{ObservabilityConfig, RolodexConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, run_command};

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    init_observability(
        &ObservabilityConfig::new()
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs),
    )?;

    let config = RolodexConfig::load_with(cli.config.as_deref())?;

    let rolodex = connect(&config).await?;
    run_command(cli.command, &rolodex, &config).await?;
    Ok(())
}

#[cfg(feature = "database")]
async fn connect(
    config: &RolodexConfig,
) -> Result<rolodex::Rolodex, Box<dyn std::error::Error>> {
    Ok(rolodex::Rolodex::connect(config).await?)
}

#[cfg(not(feature = "database"))]
async fn connect(
    _config: &RolodexConfig,
) -> Result<rolodex::Rolodex, Box<dyn std::error::Error>> {
    Err("rolodex was built without the `database` feature".into())
}
