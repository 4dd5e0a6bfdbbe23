//! URL validation for fetch candidates.

use url::Url;

use crate::error_handling::ConfigError;

/// Maximum URL length (2048 characters); longer candidates are dropped.
const MAX_URL_LENGTH: usize = 2048;

/// Validates a candidate URL: it must parse, use http/https and have a host.
///
/// Unlike page URLs, candidates are never given a default scheme; a
/// scheme-less string here means reconciliation produced something odd.
pub fn validate_fetch_url(candidate: &str) -> Result<Url, ConfigError> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.len() > MAX_URL_LENGTH {
        return Err(ConfigError::MalformedUrl(
            candidate.chars().take(50).collect(),
        ));
    }

    let url =
        Url::parse(candidate).map_err(|_| ConfigError::MalformedUrl(candidate.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ConfigError::UnsupportedScheme(candidate.to_string())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::MalformedUrl(candidate.to_string()));
    }
    Ok(url)
}
