mod commands;
mod feed;
mod providers;
mod render;
mod server;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::SyncContext;

#[derive(Parser)]
#[command(name = "meetcal")]
#[command(about = "Mirror a public meeting RSS feed into a Google Calendar")]
struct Cli {
    /// Config file (defaults to ~/.config/meetcal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed and bring the calendar up to date
    Run,
    /// Show the changes a run would make, without making them
    Status,
    /// Listen for HTTP requests that trigger a run
    Serve {
        #[arg(short, long, default_value_t = commands::serve::DEFAULT_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = SyncContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => commands::run::run(&ctx).await,
        Commands::Status => commands::status::run(&ctx).await,
        Commands::Serve { port } => commands::serve::run(ctx, port).await,
    }
}
