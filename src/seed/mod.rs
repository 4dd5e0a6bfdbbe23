//! Seed intake.
//!
//! Turns the page crawl's output (script references as they appeared in the
//! markup, inline script bodies) plus user-supplied extra URLs into absolute
//! fetchable URLs.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use crate::config::Config;
use crate::error_handling::ConfigError;

/// Scripts discovered on one page.
#[derive(Debug, Clone)]
pub struct SeedSet {
    pub page_url: Url,
    /// Absolute, protocol-relative or page-relative script references
    pub scripts: Vec<String>,
    /// Bodies of inline `<script>` elements
    pub inline_scripts: Vec<String>,
}

impl SeedSet {
    /// Empty seed set for `page_url`; a missing scheme defaults to https.
    pub fn new(page_url: &str) -> Result<Self, ConfigError> {
        let trimmed = page_url.trim();
        let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else if trimmed.contains("://") {
            return Err(ConfigError::UnsupportedScheme(trimmed.to_string()));
        } else {
            format!("https://{trimmed}")
        };
        let url = Url::parse(&normalized)
            .map_err(|_| ConfigError::MalformedUrl(page_url.to_string()))?;
        if url.host_str().is_none() {
            return Err(ConfigError::MalformedUrl(page_url.to_string()));
        }
        Ok(Self {
            page_url: url,
            scripts: Vec::new(),
            inline_scripts: Vec::new(),
        })
    }

    /// Seeds from the configuration: the page URL, `--js` entries and the
    /// `--seeds` file.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut seeds = Self::new(&config.page_url)
            .with_context(|| format!("Invalid page URL '{}'", config.page_url))?;
        seeds.scripts.extend(
            config
                .js
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        if let Some(path) = &config.seeds {
            let from_file = read_seed_file(path).await?;
            info!("Read {} seed URLs from {}", from_file.len(), path.display());
            seeds.scripts.extend(from_file);
        }
        Ok(seeds)
    }

    /// Absolute URLs for every script reference, deduplicated in order.
    ///
    /// References that cannot be resolved against the page are logged and
    /// dropped.
    pub fn resolved_scripts(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for raw in &self.scripts {
            match normalize_script_url(&self.page_url, raw) {
                Some(url) => {
                    if !out.contains(&url) {
                        out.push(url);
                    }
                }
                None => warn!("Dropping unresolvable script reference '{raw}'"),
            }
        }
        out
    }
}

/// Resolves one script reference against the page it was found on.
///
/// `http(s)://` references are kept as written, `//host/...` takes the page's
/// scheme and anything else is joined to the page URL.
pub fn normalize_script_url(page_url: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(raw.to_string());
    }
    if raw.starts_with("//") {
        return Some(format!("{}:{raw}", page_url.scheme()));
    }
    page_url.join(raw).ok().map(String::from)
}

/// Reads one URL per line, skipping blank lines and `#` comments.
pub async fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open seed file {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut seeds = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read seed file")?
    {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            seeds.push(trimmed.to_string());
        }
    }
    Ok(seeds)
}
