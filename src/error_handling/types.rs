//! Error type definitions.
//!
//! This module defines all error, warning, and info types used throughout the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The proxy URL could not be parsed.
    #[error("Invalid proxy URL '{0}'")]
    InvalidProxy(String),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the namespace directory or database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A snippet was offered for an asset that is missing or not yet successful.
    #[error("Asset '{0}' does not exist or has not been downloaded successfully")]
    AssetNotReady(String),
}

/// Errors from downloading a single asset.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or HTTP status failure (after retries, if retriable).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ReqwestError),

    /// The payload looks like an HTML page, not JavaScript.
    #[error("Response is an HTML document, not JavaScript")]
    HtmlPayload,

    /// The payload exceeds the configured size cap.
    #[error("Response body too large ({0} bytes)")]
    BodyTooLarge(usize),

    /// Writing the downloaded bytes to the namespace directory failed.
    #[error("Failed to write asset to disk: {0}")]
    Io(#[from] std::io::Error),

    /// Persisting the asset state failed.
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

/// Errors from configuration entries; the offending entry is dropped.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A URL without scheme or host.
    #[error("Malformed URL '{0}'")]
    MalformedUrl(String),

    /// A URL with a scheme other than http/https.
    #[error("Unsupported scheme in URL '{0}'")]
    UnsupportedScheme(String),

    /// An extra header not in `Name: value` form or with invalid characters.
    #[error("Invalid header '{0}'")]
    InvalidHeader(String),

    /// A blacklist entry that can never match anything useful.
    #[error("Invalid blacklist entry '{0}'")]
    InvalidBlacklistEntry(String),
}

/// Errors from the sandboxed resolver.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// QuickJS runtime or context could not be created.
    #[error("Failed to create QuickJS runtime: {0}")]
    Runtime(String),

    /// The synthesized loader function failed to compile or install.
    #[error("Failed to install loader function: {0}")]
    Install(String),

    /// The parameter name is not a plain identifier.
    #[error("Invalid loader parameter '{0}'")]
    InvalidParameter(String),
}

/// Errors from merging a resolved file name with the resolution base.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Joining the merged path against the origin failed.
    #[error("Failed to join '{path}' onto '{base}': {source}")]
    Join {
        path: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    /// The resolution base has no host to take an origin from.
    #[error("Resolution base '{0}' has no origin")]
    OpaqueBase(String),
}

/// Types of errors that can occur during recovery.
///
/// This enum categorizes actual error conditions - failures that prevent an
/// asset from being downloaded or a loader from being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // HTTP/Network errors
    HttpRequestTimeoutError,
    HttpRequestConnectError,
    HttpRequestTooManyRequests,
    HttpRequestNotFound,
    HttpRequestForbidden,
    HttpRequestClientError,
    HttpRequestServerError,
    HttpRequestOtherError,
    // Content errors
    ContentHtmlPayload,
    ContentTooLarge,
    // Input errors
    MalformedUrl,
    // Persistence
    StoreWriteError,
    FileWriteError,
    // Analysis
    SandboxError,
}

/// Types of warnings that can occur during recovery.
///
/// Warnings indicate lower-confidence outcomes that don't stop the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum WarningType {
    /// No public path was found; chunks were resolved against the script URL
    MissingPublicPath,
    /// A merged URL fell back to a naive relative join
    NaiveUrlJoin,
    /// The syntax tree could not be produced
    ParseFailure,
    /// A loader call threw or hit the deadline
    CandidateEvalFailure,
}

/// Types of informational metrics that can occur during recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// URL already present in the store; not fetched again
    DuplicateUrl,
    /// URL dropped by the domain or file-name blacklist
    Blacklisted,
    /// Loader found by the syntax-tree search
    StructuralLoader,
    /// Loader found by the regex fallback
    RegexLoader,
    /// Fallback capture discarded for exceeding the size threshold
    OversizedSnippet,
    /// File analyzed with no loader found
    NoLoader,
    /// Alternate path proposed from learned chunk directories
    InferredPath,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpRequestTimeoutError => "HTTP request timeout error",
            ErrorType::HttpRequestConnectError => "HTTP request connect error",
            ErrorType::HttpRequestTooManyRequests => "Too many requests (429)",
            ErrorType::HttpRequestNotFound => "Not Found (404)",
            ErrorType::HttpRequestForbidden => "Forbidden (403)",
            ErrorType::HttpRequestClientError => "Other client error (4xx)",
            ErrorType::HttpRequestServerError => "Server error (5xx)",
            ErrorType::HttpRequestOtherError => "HTTP request other error",
            ErrorType::ContentHtmlPayload => "HTML payload instead of JavaScript",
            ErrorType::ContentTooLarge => "Response body too large",
            ErrorType::MalformedUrl => "Malformed URL",
            ErrorType::StoreWriteError => "Store write error",
            ErrorType::FileWriteError => "File write error",
            ErrorType::SandboxError => "Sandbox error",
        }
    }
}

impl std::fmt::Display for WarningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::MissingPublicPath => "Missing public path",
            WarningType::NaiveUrlJoin => "Naive URL join fallback",
            WarningType::ParseFailure => "Syntax tree parse failure",
            WarningType::CandidateEvalFailure => "Candidate evaluation failure",
        }
    }
}

impl std::fmt::Display for InfoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::DuplicateUrl => "Duplicate URL skipped",
            InfoType::Blacklisted => "Blacklisted URL skipped",
            InfoType::StructuralLoader => "Loader found (structural)",
            InfoType::RegexLoader => "Loader found (regex)",
            InfoType::OversizedSnippet => "Oversized snippet discarded",
            InfoType::NoLoader => "No loader in file",
            InfoType::InferredPath => "Inferred alternate path",
        }
    }
}
