#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    // Logging is installed by the CLI layer once the run directory exists,
    // because every run also writes its own log.txt.
    let cli = Cli::parse();
    cli.run()
}
