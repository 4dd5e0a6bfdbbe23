//! Dedup/lineage store.
//!
//! `AssetStore` is the single source of truth for "already seen". It owns the
//! `assets` and `snippets` tables of one namespace; other components read and
//! append through its API and never write rows directly.

mod assets;
mod snippets;

use std::sync::Arc;

use sqlx::{Row, SqlitePool};

use super::migrations::run_migrations;
use super::models::StoreSummary;
use super::namespace::RunNamespace;
use super::pool::init_db_pool_with_path;
use crate::error_handling::DatabaseError;

pub use assets::asset_file_name;

/// Handle on the namespace database.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct AssetStore {
    pool: Arc<SqlitePool>,
    namespace: RunNamespace,
}

impl AssetStore {
    /// Opens (creating if needed) the namespace directory and database and
    /// applies migrations.
    pub async fn open(namespace: RunNamespace, max_connections: u32) -> Result<Self, DatabaseError> {
        namespace.ensure_dir()?;
        let pool = init_db_pool_with_path(&namespace.db_path(), max_connections).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool, namespace })
    }

    pub fn namespace(&self) -> &RunNamespace {
        &self.namespace
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Row counts for the run summary.
    pub async fn summary(&self) -> Result<StoreSummary, DatabaseError> {
        let row = sqlx::query(
            "SELECT
                 COUNT(*),
                 COALESCE(SUM(success = 1), 0),
                 COALESCE(SUM(success = 0 AND failure_reason IS NOT NULL), 0),
                 (SELECT COUNT(*) FROM snippets)
             FROM assets",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(StoreSummary {
            assets_discovered: row.get(0),
            assets_downloaded: row.get(1),
            assets_failed: row.get(2),
            snippets_recovered: row.get(3),
        })
    }
}
