// ABOUTME: Entry point for rave: live-coding block tools for Markdown documents.
// ABOUTME: Parses CLI args, sets up tracing, loads config, and runs the app.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rave::app::{App, AppCommand};
use rave::config::Config;

#[derive(Debug, Parser)]
#[command(name = "rave", version, about = "Locate, share, and track live-coding blocks")]
struct Cli {
    /// Config file (defaults to ~/.rave/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: AppCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rave=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    App::new(config).run(cli.command).await
}
