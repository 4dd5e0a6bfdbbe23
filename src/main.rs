//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `chunk_recover` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use chunk_recover::initialization::init_logger_with;
use chunk_recover::{run_recovery, Config, SeedSet};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let seeds = match SeedSet::from_config(&config).await {
        Ok(seeds) => seeds,
        Err(e) => {
            eprintln!("chunk_recover error: {:#}", e);
            process::exit(2);
        }
    };

    match run_recovery(config, seeds).await {
        Ok(report) => {
            println!(
                "Recovered {} of {} asset{} ({} failed, {} loader snippet{}) in {} round{}, {:.1}s",
                report.assets_downloaded,
                report.assets_discovered,
                if report.assets_discovered == 1 { "" } else { "s" },
                report.assets_failed,
                report.snippets_recovered,
                if report.snippets_recovered == 1 { "" } else { "s" },
                report.rounds,
                if report.rounds == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            println!("Files saved in {}", report.namespace_dir.display());
            println!("Lineage database: {}", report.db_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("chunk_recover error: {:#}", e);
            process::exit(1);
        }
    }
}
