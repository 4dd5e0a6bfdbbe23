//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions and categorization
//! - Processing statistics tracking (errors, warnings, info metrics)
//! - Retry strategy configuration
//!
//! Error types are categorized into:
//! - **Errors**: Failures that lose an asset or a loader
//! - **Warnings**: Lower-confidence outcomes (missing public path, naive joins)
//! - **Info**: Informational metrics (duplicates, blacklist hits, loader kinds)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_fetch_error, categorize_reqwest_error, get_retry_strategy};
pub use stats::ProcessingStats;
pub use types::{
    ConfigError, DatabaseError, ErrorType, FetchError, InfoType, InitializationError,
    ReconcileError, SandboxError, WarningType,
};
