//! URL reconciliation.
//!
//! Turns file names produced by a loader into absolute chunk URLs:
//! 1. pick a resolution base (public path in the file, namespace cache, or
//!    the file's own URL)
//! 2. merge each name onto that base with a path-overlap heuristic

mod merge;
mod public_path;

pub use merge::{merge_chunk_url, naive_join};
pub use public_path::{find_public_path, resolution_base, BaseSource, ResolutionBase};

use log::{debug, warn};
use url::Url;

use crate::error_handling::{ProcessingStats, WarningType};

/// An absolute chunk URL and the snippet that revealed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkUrl {
    pub url: Url,
    pub snippet_id: i64,
}

/// Converts resolved file names into absolute URLs against `base`.
///
/// A failed merge degrades to a naive relative join; a name that cannot be
/// joined at all is dropped. Duplicate URLs are collapsed.
pub fn reconcile<'a, I>(
    base: &Url,
    names: I,
    snippet_id: i64,
    stats: &ProcessingStats,
) -> Vec<ChunkUrl>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<ChunkUrl> = Vec::new();
    for name in names {
        let url = match merge_chunk_url(base, name) {
            Ok(url) => url,
            Err(e) => {
                warn!("Merge failed for '{name}' ({e}); falling back to a relative join");
                stats.increment_warning(WarningType::NaiveUrlJoin);
                match naive_join(base, name) {
                    Some(url) => url,
                    None => {
                        warn!("Dropping chunk name '{name}': cannot be joined onto {base}");
                        continue;
                    }
                }
            }
        };
        if out.iter().any(|c| c.url == url) {
            continue;
        }
        debug!("Chunk '{name}' -> {url}");
        out.push(ChunkUrl { url, snippet_id });
    }
    out
}
