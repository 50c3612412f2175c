//! Blackhole CLI - drives torrents through Real-Debrid
//!
//! Provides command-line access to the Blackhole lifecycle engine.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use blackhole_core::tracing_setup::{CliLogLevel, init_tracing};
use clap::Parser;

#[derive(Parser)]
#[command(name = "blackhole")]
#[command(about = "Moves torrents through a debrid cache onto a local mount")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,
    /// Directory for the full trace log of this run
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    if let Err(e) = commands::handle_command(cli.command).await {
        tracing::debug!("Command failed: {:?}", e);
        let message = e.user_message();
        return Err(e).context(message);
    }

    Ok(())
}
