//! Command line surface of the `callpilot` binary.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "callpilot",
    version,
    about = "Turn a sales-call email thread and recording into plans, emails and CRM records",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Settings file (defaults to <config dir>/callpilot/settings.ron)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also log to the terminal, at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store the completion endpoint and token
    Configure(ConfigureArgs),
    /// Print the current settings with the token hidden
    ShowConfig,
    /// Process one call: email thread first, then the recording
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Completion endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// API token sent as the bearer credential
    #[arg(long, value_name = "TOKEN")]
    pub token: String,

    /// Model identifier sent with every request
    #[arg(long)]
    pub model: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Plain-text email thread
    #[arg(long, value_name = "FILE")]
    pub email: PathBuf,

    /// Audio recording of the call
    #[arg(long, value_name = "FILE", conflicts_with = "transcript", required_unless_present = "transcript")]
    pub audio: Option<PathBuf>,

    /// Transcript of the call
    #[arg(long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Write the opportunity export after processing
    #[arg(long)]
    pub export: bool,

    /// Directory for the export file
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,
}
