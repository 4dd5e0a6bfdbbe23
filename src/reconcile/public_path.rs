//! Public base path discovery and resolution-base selection.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use url::Url;

use crate::error_handling::{ProcessingStats, WarningType};

/// `__webpack_require__.p = "..."` or a minified alias such as `n.p = '...'`.
static PUBLIC_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:__webpack_require__|[\w$]+)\.p\s*=\s*["']([^"']*)["']"#)
        .expect("public path regex is valid")
});

/// Returns the first public path assignment in `content`.
pub fn find_public_path(content: &str) -> Option<&str> {
    PUBLIC_PATH_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Where the resolution base came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSource {
    /// Public path assigned in the analyzed file itself
    Content,
    /// Public path cached for the namespace by the fetch layer
    NamespaceCache,
    /// No public path known; the file's own URL
    AssetUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionBase {
    pub url: Url,
    pub source: BaseSource,
}

/// Picks the base that chunk names of `asset_url` are merged onto.
///
/// The public path found in `content` is joined against the asset URL; if
/// there is none, `cached` (an absolute public path seen elsewhere in the
/// namespace) is used; otherwise the asset URL itself, with a warning.
pub fn resolution_base(
    asset_url: &Url,
    content: &str,
    cached: Option<&Url>,
    stats: &ProcessingStats,
) -> ResolutionBase {
    if let Some(public_path) = find_public_path(content) {
        match asset_url.join(public_path) {
            Ok(url) => {
                return ResolutionBase {
                    url,
                    source: BaseSource::Content,
                }
            }
            Err(e) => warn!("Ignoring public path '{public_path}' in {asset_url}: {e}"),
        }
    }

    if let Some(cached) = cached {
        return ResolutionBase {
            url: cached.clone(),
            source: BaseSource::NamespaceCache,
        };
    }

    warn!("No public path for {asset_url}; resolving chunks against the script URL");
    stats.increment_warning(WarningType::MissingPublicPath);
    ResolutionBase {
        url: asset_url.clone(),
        source: BaseSource::AssetUrl,
    }
}
