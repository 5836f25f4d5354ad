//! `shellgram` -- run shell commands on a host from a Telegram chat.
//!
//! Provides the following subcommands:
//!
//! - `shellgram run` -- Poll Telegram and execute commands from allowed senders
//!   (the default when no subcommand is given).
//! - `shellgram config` -- Show the resolved configuration with the token redacted.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// Telegram-driven remote command runner.
#[derive(Parser)]
#[command(name = "shellgram", about = "Run shell commands from a Telegram chat", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Start polling and dispatching commands.
    Run,

    /// Show resolved configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(cli.config.as_deref()).await?,
        Commands::Config => commands::config_cmd::run(cli.config.as_deref()).await?,
    }
    Ok(())
}
