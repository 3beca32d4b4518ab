use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use super::Cli;
use crate::cli_cmds::cmd_sort;
use crate::config::Config;
use crate::options::SortOptions;

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let options = SortOptions::from_cli(&cli, &config).context("Invalid arguments")?;

    cmd_sort(&options, cli.json)
}

/// Diagnostics go to stderr so they never mix with the action log.
fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
