mod application;
mod presentation;

use clap::Parser;
use lore_core::error::Result;
use tracing_subscriber::EnvFilter;

use crate::presentation::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    application::run(cli)
}
