// Shared test helpers for pipeline and fetch-layer tests.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::path::Path;

use url::Url;

use chunk_recover::storage::{AssetStore, RunNamespace};
use chunk_recover::{Config, LogFormat, LogLevel};

/// Run tag used by every integration test.
pub const TEST_RUN_TAG: &str = "itest";

/// Builds a Config for tests: no retries, short timeouts, quiet logs.
pub fn test_config(output_dir: &Path, page_url: &str) -> Config {
    Config {
        page_url: page_url.to_string(),
        output_dir: output_dir.to_path_buf(),
        run_tag: Some(TEST_RUN_TAG.to_string()),
        max_concurrency: 4,
        connect_timeout_secs: 2,
        read_timeout_secs: 5,
        max_retries: 0,
        log_level: LogLevel::Error, // Reduce noise in tests
        log_format: LogFormat::Plain,
        ..Default::default()
    }
}

/// Reopens the namespace store of a finished run.
#[allow(dead_code)] // Used by other test files
pub async fn open_store(output_dir: &Path, page_url: &str) -> AssetStore {
    let target = Url::parse(page_url).expect("valid page URL");
    let namespace =
        RunNamespace::new(output_dir, TEST_RUN_TAG, &target).expect("Failed to build namespace");
    AssetStore::open(namespace, 2)
        .await
        .expect("Failed to reopen namespace store")
}

/// A bundle entry point declaring `public_path` and a loader over `map`.
///
/// `map` is the object literal body, e.g. `0:"a",1:"b"`.
#[allow(dead_code)] // Used by other test files
pub fn loader_script(public_path: &str, map: &str) -> String {
    format!(
        "!function(){{var __x={{}};__x.p=\"{public_path}\";\
         __x.u=function(e){{return {{{map}}}[e]+\".js\"}};}}();"
    )
}
