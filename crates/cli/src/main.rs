//! Relaycord CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `doctor`  — Check configuration and credentials
//! - `reply`   — Relay a single Discord message through the model

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "relaycord",
    about = "Relaycord — streams LLM replies into Discord conversations",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.relaycord/config.toml
    #[arg(short, long, global = true, env = "RELAYCORD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configuration file
    Onboard,

    /// Diagnose configuration and credentials
    Doctor,

    /// Answer one message, streaming the reply into its channel
    Reply {
        /// Channel the message was posted in
        #[arg(long)]
        channel: String,

        /// ID of the message to answer
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run(cli.config).await?,
        Commands::Doctor => commands::doctor::run(cli.config).await?,
        Commands::Reply { channel, message } => {
            commands::reply::run(cli.config, channel, message).await?
        }
    }

    Ok(())
}
