//! scrapechain CLI — one search term, four external stages, fail-fast.
//!
//! Prompts for a search term, then runs the fetch, load, export, and index
//! programs in order, exiting with the first failing stage's status.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
