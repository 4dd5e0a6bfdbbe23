//! Persistence for one run namespace.
//!
//! - `namespace`: directory and database layout of a (run tag, host) pair
//! - `store`: the dedup/lineage store over `assets` and `snippets`
//! - `runs`: run metadata and final statistics

pub mod migrations;
pub mod models;
pub mod namespace;
pub mod pool;
pub mod runs;
mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use models::{Asset, ExtractionMethod, Snippet, StoreSummary};
pub use namespace::{default_run_tag, RunNamespace};
pub use runs::{insert_run_metadata, update_run_stats, RunMetadata, RunStats};
pub use store::{asset_file_name, AssetStore};
