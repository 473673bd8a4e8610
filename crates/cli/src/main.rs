//! watchmux CLI - watch paths and print what changes

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

/// watchmux - multiplexed file system notifications
#[derive(Parser)]
#[command(name = "watchmux")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch paths and print every delivered event
    Watch {
        /// Paths to watch
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Comma separated event names (default: all)
        #[arg(short, long, default_value = "all")]
        events: String,

        /// Also report changes anywhere below each path
        #[arg(short, long)]
        recursive: bool,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the event names understood on this platform
    Events,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { paths, events, recursive, config } => {
            cmd::watch::run(&paths, &events, recursive, config.as_deref())
        }
        Commands::Events => cmd::events::run(),
    }
}
