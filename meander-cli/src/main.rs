mod resolve;
mod version;

use anyhow::Result;
use clap::{Parser, Subcommand};
use resolve::Resolve;

#[derive(Debug, Parser)]
#[command(name = "meander-cli")]
#[command(about = "A command-line tool to resolve messaging topology definitions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Resolve a topology definitions file into live connections")]
    Resolve(Resolve),

    #[command(about = "Show the version of the protocol client library in use")]
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve(resolve) => resolve::handle_resolve(resolve).await?,
        Commands::Version => version::handle_version(),
    }

    Ok(())
}
