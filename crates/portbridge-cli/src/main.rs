//! portbridge CLI - bring up an audio adapter against an in-memory host graph.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portbridge")]
#[command(author, version, about = "Audio port adapter bring-up tool", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the adapter, optionally run host blocks through it, then unload
    Run(commands::run::RunArgs),

    /// Register the adapter's ports only and list them
    Ports(commands::ports::PortsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Ports(args) => commands::ports::run(args),
    }
}
