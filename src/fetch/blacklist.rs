//! Domain and file-name blacklist.

use log::warn;
use url::Url;

use crate::error_handling::ConfigError;

/// URLs that are never fetched.
///
/// A URL is blocked when its host contains a blocked domain or its file name
/// contains a blocked substring. Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    domains: Vec<String>,
    filenames: Vec<String>,
}

impl Blacklist {
    /// Builds the blacklist, dropping (and logging) unusable entries.
    pub fn new(domains: &[String], filenames: &[String]) -> Self {
        Self {
            domains: normalize_entries(domains),
            filenames: normalize_entries(filenames),
        }
    }

    pub fn is_blocked(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if self.domains.iter().any(|d| host.contains(d.as_str())) {
            return true;
        }

        let file_name = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or_default()
            .to_ascii_lowercase();
        !file_name.is_empty() && self.filenames.iter().any(|f| file_name.contains(f.as_str()))
    }
}

fn normalize_entries(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| match check_entry(entry) {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("{err}; entry ignored");
                None
            }
        })
        .collect()
}

fn check_entry(entry: &str) -> Result<String, ConfigError> {
    let trimmed = entry.trim().to_ascii_lowercase();
    if trimmed.is_empty() || trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidBlacklistEntry(entry.to_string()));
    }
    Ok(trimmed)
}
