//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BLACKLIST_DOMAINS, DEFAULT_BLACKLIST_FILENAMES,
    DEFAULT_MAX_ROUNDS, DEFAULT_OUTPUT_DIR, READ_TIMEOUT_SECS, RETRY_MAX_RETRIES, SEMAPHORE_LIMIT,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Recovery configuration.
///
/// Doubles as the CLI definition for the binary and as a plain struct for
/// library callers, who can build it with `..Default::default()`.
///
/// # Examples
///
/// ```no_run
/// use chunk_recover::Config;
///
/// let config = Config {
///     page_url: "https://app.example.com/".to_string(),
///     js: vec!["https://app.example.com/static/js/main.js".to_string()],
///     max_concurrency: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chunk_recover",
    version,
    about = "Recovers lazily-loaded JavaScript chunks of a bundled web application"
)]
pub struct Config {
    /// Page the seed scripts were discovered on (used to resolve relative seeds)
    pub page_url: String,

    /// Extra JS URLs to seed alongside the crawl results (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub js: Vec<String>,

    /// File containing seed script URLs, one per line ('#' starts a comment)
    #[arg(long)]
    pub seeds: Option<PathBuf>,

    /// Directory under which the run namespace is created
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Run tag (defaults to `run_<timestamp_millis>`)
    #[arg(long)]
    pub run_tag: Option<String>,

    /// Maximum concurrent downloads
    #[arg(long, default_value_t = SEMAPHORE_LIMIT)]
    pub max_concurrency: usize,

    /// TCP connect timeout in seconds
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds
    #[arg(long, default_value_t = READ_TIMEOUT_SECS)]
    pub read_timeout_secs: u64,

    /// Disable TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Proxy URL applied to every request (http, https or socks)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Extra request header in `Name: value` form
    #[arg(long)]
    pub header: Option<String>,

    /// Cookie header value
    #[arg(long)]
    pub cookie: Option<String>,

    /// Domains that are never fetched (comma-separated, substring match)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_BLACKLIST_DOMAINS.iter().map(|s| s.to_string()))]
    pub blacklist_domains: Vec<String>,

    /// File-name substrings that are never fetched (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_BLACKLIST_FILENAMES.iter().map(|s| s.to_string()))]
    pub blacklist_filenames: Vec<String>,

    /// Retries per URL after the initial attempt
    #[arg(long, default_value_t = RETRY_MAX_RETRIES)]
    pub max_retries: usize,

    /// Maximum recovery rounds (0 = until no new chunks are found)
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: usize,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            js: Vec::new(),
            seeds: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            run_tag: None,
            max_concurrency: SEMAPHORE_LIMIT,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            insecure: false,
            proxy: None,
            header: None,
            cookie: None,
            blacklist_domains: DEFAULT_BLACKLIST_DOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blacklist_filenames: DEFAULT_BLACKLIST_FILENAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_retries: RETRY_MAX_RETRIES,
            max_rounds: DEFAULT_MAX_ROUNDS,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Round cap as an `Option`, with 0 meaning unlimited.
    pub fn round_limit(&self) -> Option<usize> {
        (self.max_rounds > 0).then_some(self.max_rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_concurrency, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.read_timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.round_limit(), Some(10));
        assert!(!config.insecure);
        assert_eq!(config.output_dir, PathBuf::from("tmp"));
        assert!(config.blacklist_domains.contains(&"googletagmanager.com".to_string()));
    }

    #[test]
    fn test_round_limit_zero_is_unlimited() {
        let config = Config {
            max_rounds: 0,
            ..Default::default()
        };
        assert_eq!(config.round_limit(), None);
    }

    #[test]
    fn test_cli_parsing_splits_comma_lists() {
        let config = Config::try_parse_from([
            "chunk_recover",
            "https://app.example.com/",
            "--js",
            "https://a.example.com/x.js,https://a.example.com/y.js",
            "--blacklist-domains",
            "cdn.bad.com",
            "--max-rounds",
            "0",
            "--insecure",
        ])
        .expect("valid arguments should parse");

        assert_eq!(config.page_url, "https://app.example.com/");
        assert_eq!(config.js.len(), 2);
        assert_eq!(config.blacklist_domains, vec!["cdn.bad.com".to_string()]);
        assert_eq!(config.round_limit(), None);
        assert!(config.insecure);
        // Untouched lists keep their defaults
        assert!(config.blacklist_filenames.contains(&"jquery".to_string()));
    }
}
