//! Shared state for download workers.

use std::sync::Arc;

use super::blacklist::Blacklist;
use super::patterns::{PathPatternRegistry, PublicPathCache};
use super::request::RequestOptions;
use crate::config::Config;
use crate::error_handling::ProcessingStats;
use crate::storage::AssetStore;

/// Context containing all shared resources needed by download workers.
///
/// One context lives for the whole run; workers hold it through an `Arc`.
pub struct FetchContext {
    /// HTTP client (timeouts, proxy, TLS toggle already applied)
    pub client: Arc<reqwest::Client>,
    /// Namespace store, the single source of truth for "already seen"
    pub store: AssetStore,
    /// Error statistics tracker
    pub stats: Arc<ProcessingStats>,
    pub blacklist: Blacklist,
    pub request_options: RequestOptions,
    /// Learned chunk directories for alternate-path inference
    pub patterns: PathPatternRegistry,
    /// First public path seen in any downloaded file
    pub public_path: PublicPathCache,
    /// Retries after the initial attempt
    pub max_retries: usize,
    /// Worker pool width
    pub max_concurrency: usize,
}

impl FetchContext {
    pub fn new(
        config: &Config,
        client: Arc<reqwest::Client>,
        store: AssetStore,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            client,
            store,
            stats,
            blacklist: Blacklist::new(&config.blacklist_domains, &config.blacklist_filenames),
            request_options: RequestOptions::from_config(config),
            patterns: PathPatternRegistry::new(),
            public_path: PublicPathCache::new(),
            max_retries: config.max_retries,
            max_concurrency: config.max_concurrency.max(1),
        }
    }
}
