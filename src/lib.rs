//! chunk_recover library: recovery of lazily-loaded JavaScript chunks
//!
//! Given the script URLs found on a page, this library downloads the bundle
//! entry points, finds the dynamic chunk-loader function inside each one,
//! evaluates it in a QuickJS sandbox against the module ids it references,
//! turns the resulting file names into absolute URLs and feeds them back into
//! the downloader until no new chunks appear. Every asset and loader snippet
//! is recorded with its lineage in a per-run SQLite database.
//!
//! # Example
//!
//! ```no_run
//! use chunk_recover::{run_recovery, Config, SeedSet};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     page_url: "https://app.example.com/".to_string(),
//!     max_concurrency: 10,
//!     ..Default::default()
//! };
//!
//! let mut seeds = SeedSet::new(&config.page_url)?;
//! seeds.scripts.push("/static/js/main.js".to_string());
//!
//! let report = run_recovery(config, seeds).await?;
//! println!(
//!     "Recovered {} assets into {}",
//!     report.assets_downloaded,
//!     report.namespace_dir.display()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
pub mod error_handling;
pub mod extract;
pub mod fetch;
pub mod initialization;
mod pipeline;
pub mod reconcile;
pub mod sandbox;
pub mod seed;
pub mod storage;
mod utils;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::ProcessingStats;
pub use pipeline::{print_processing_statistics, run_recovery, RecoveryReport};
pub use seed::SeedSet;
