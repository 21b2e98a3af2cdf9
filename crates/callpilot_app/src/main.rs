mod cli;
mod platform;

use clap::Parser;
use log::LevelFilter;
use pilot_logging::{LogDestination, DEFAULT_LOG_FILE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let (destination, level) = if cli.verbose {
        (LogDestination::Both(DEFAULT_LOG_FILE.into()), LevelFilter::Debug)
    } else {
        (LogDestination::File(DEFAULT_LOG_FILE.into()), LevelFilter::Info)
    };
    pilot_logging::initialize(destination, level);
    platform::run(cli).await
}
