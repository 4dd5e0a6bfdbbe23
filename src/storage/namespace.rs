//! Run namespace: the (run tag, target host) pair owning one database and
//! one download directory.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error_handling::{ConfigError, DatabaseError};

/// Identity of one recovery run against one target host.
///
/// Every downloaded file and the run's SQLite database live under
/// `<output_dir>/<tag>_<host>/`. Ports in the host are written as `_` so the
/// directory name stays portable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNamespace {
    tag: String,
    host: String,
    dir: PathBuf,
}

impl RunNamespace {
    /// Builds the namespace for `target` under `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MalformedUrl` if the target has no host.
    pub fn new(output_dir: &Path, tag: &str, target: &Url) -> Result<Self, ConfigError> {
        let host = target
            .host_str()
            .ok_or_else(|| ConfigError::MalformedUrl(target.to_string()))?;
        let host = match target.port() {
            Some(port) => format!("{host}_{port}"),
            None => host.to_string(),
        };
        let host = host.replace(':', "_");
        let dir = output_dir.join(format!("{tag}_{host}"));
        Ok(Self {
            tag: tag.to_string(),
            host,
            dir,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Directory holding the database and the downloaded files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the namespace database, `<dir>/<tag>.db`.
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(format!("{}.db", self.tag))
    }

    /// Local path of a downloaded asset.
    pub fn asset_path(&self, alias: &str) -> PathBuf {
        self.dir.join(alias)
    }

    /// Creates the namespace directory if it does not exist.
    pub fn ensure_dir(&self) -> Result<(), DatabaseError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DatabaseError::FileCreationError(format!("{}: {e}", self.dir.display()))
        })
    }
}

/// Default run tag, `run_<timestamp_millis>`.
pub fn default_run_tag() -> String {
    format!("run_{}", chrono::Utc::now().timestamp_millis())
}
