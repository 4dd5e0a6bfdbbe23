//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the application,
//! including timeouts, size limits, and other operational parameters.

use std::time::Duration;

/// Default width of the download worker pool (semaphore limit)
pub const SEMAPHORE_LIMIT: usize = 30;
/// Default output directory; each run gets a `<tag>_<host>` namespace below it
pub const DEFAULT_OUTPUT_DIR: &str = "tmp";

// Network operation timeouts
/// TCP connection timeout in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Read timeout in seconds (applies to each read of the response body)
/// Bundles can be several megabytes, so this is deliberately longer than the connect timeout
pub const READ_TIMEOUT_SECS: u64 = 30;
/// SQLite busy timeout; concurrent workers write to the same database file
pub const DB_BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept header sent with every script request.
pub const SCRIPT_ACCEPT_HEADER: &str = "application/javascript, text/javascript, */*; q=0.01";

/// User-Agent pool rotated across requests.
///
/// One entry is picked at random for each request so that a burst of chunk
/// downloads does not present a single fingerprint to the origin.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Domains that are never fetched (analytics and tag managers carry no bundle chunks)
pub const DEFAULT_BLACKLIST_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "hm.baidu.com",
    "cnzz.com",
];
/// File-name substrings that are never fetched (well-known third-party libraries)
pub const DEFAULT_BLACKLIST_FILENAMES: &[&str] = &["jquery", "bootstrap"];

// Response and body size limits
/// Maximum downloaded asset size in bytes (20MB)
/// Larger bodies are treated as content errors rather than written to disk
pub const MAX_ASSET_BODY_SIZE: usize = 20 * 1024 * 1024;

// Error message size limits
/// Maximum failure reason length stored on an asset row (2000 chars)
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;

// Loader extraction limits
/// Regex-fallback captures longer than this are discarded instead of evaluated
pub const MAX_FALLBACK_SNIPPET_CHARS: usize = 30_000;
/// Length of the random tag prefixed to every local alias
pub const ALIAS_TAG_LENGTH: usize = 6;
/// Maximum byte length of the sanitized file-name part of an alias
/// Keeps `<tag>.<name>` well under the 255-byte file-name limit
pub const MAX_LOCAL_FILE_NAME_LENGTH: usize = 200;

// Sandbox limits
/// Maximum wall-clock time for one loader call in milliseconds
/// Prevents a hostile or looping snippet from hanging the file's analysis
pub const MAX_JS_EXECUTION_TIME_MS: u64 = 1000;
/// Maximum memory limit for the QuickJS runtime in bytes (32MB)
/// Chunk maps of very large applications can hold several thousand entries
pub const MAX_JS_MEMORY_LIMIT: usize = 32 * 1024 * 1024;
/// Maximum QuickJS stack size in bytes (512KB)
pub const MAX_JS_STACK_SIZE: usize = 512 * 1024;

// Retry strategy
/// Base of the exponential backoff (delays are base^n * factor milliseconds)
pub const RETRY_BASE_MS: u64 = 2;
/// Multiplier applied to the backoff; 2^1 * 500 = 1s, then 2s, 4s, ...
pub const RETRY_FACTOR: u64 = 500;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 15;
/// Default number of retries after the initial attempt
pub const RETRY_MAX_RETRIES: usize = 3;

// Discovery loop
/// Default cap on recovery rounds (0 disables the cap)
pub const DEFAULT_MAX_ROUNDS: usize = 10;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
