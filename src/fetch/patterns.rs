//! Path-pattern learning and the namespace public-path cache.

use std::collections::BTreeSet;

use log::debug;
use tokio::sync::RwLock;
use url::Url;

/// Learned "chunk" directories.
///
/// Every successful download whose file name contains `chunk` teaches the
/// registry its directory. When a direct download later fails, the registry
/// proposes the same file name under each learned directory.
#[derive(Debug, Default)]
pub struct PathPatternRegistry {
    dirs: RwLock<BTreeSet<String>>,
}

impl PathPatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the directory of `url` if its file name looks like a chunk.
    /// Returns `true` when a new directory was learned.
    pub async fn record_success(&self, url: &Url) -> bool {
        let path = url.path();
        let Some(idx) = path.rfind('/') else {
            return false;
        };
        let (dir, file_name) = path.split_at(idx + 1);
        if !file_name.to_ascii_lowercase().contains("chunk") {
            return false;
        }
        let learned = self.dirs.write().await.insert(dir.to_string());
        if learned {
            debug!("Learned chunk directory {dir}");
        }
        learned
    }

    /// Alternate candidates for a failed `url`: its file name under every
    /// learned directory on the same origin, excluding `url` itself.
    pub async fn alternates(&self, url: &Url) -> Vec<Url> {
        let file_name = match url.path_segments().and_then(|mut s| s.next_back()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Vec::new(),
        };

        let dirs = self.dirs.read().await;
        dirs.iter()
            .filter_map(|dir| url.join(&format!("{dir}{file_name}")).ok())
            .filter(|candidate| candidate.path() != url.path())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.dirs.read().await.len()
    }
}

/// First public base path seen in any downloaded file of the namespace,
/// already resolved to an absolute URL.
#[derive(Debug, Default)]
pub struct PublicPathCache {
    inner: RwLock<Option<Url>>,
}

impl PublicPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Url> {
        self.inner.read().await.clone()
    }

    /// Stores `url` unless a value is already cached. Returns `true` if stored.
    pub async fn offer(&self, url: Url) -> bool {
        let mut guard = self.inner.write().await;
        if guard.is_some() {
            return false;
        }
        debug!("Caching namespace public path {url}");
        *guard = Some(url);
        true
    }
}
