//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - WAL mode enabled for concurrent access
//! - A busy timeout so concurrent workers wait instead of failing
//! - Automatic database file creation

use std::path::Path;
use std::sync::Arc;

use log::{debug, error};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DB_BUSY_TIMEOUT;
use crate::error_handling::DatabaseError;

/// Initializes and returns a database connection pool for `db_path`.
///
/// Creates the database file if it doesn't exist. The pool holds at most
/// `max_connections` connections (at least one).
pub async fn init_db_pool_with_path(
    db_path: &Path,
    max_connections: u32,
) -> Result<Arc<SqlitePool>, DatabaseError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(DB_BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to open database {}: {e}", db_path.display());
            DatabaseError::SqlError(e)
        })?;

    debug!("Opened database {}", db_path.display());
    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_pool_creates_file_in_wal_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t.db");
        let pool = init_db_pool_with_path(&path, 4).await.unwrap();
        assert!(path.exists());

        let mode: String = sqlx::query("PRAGMA journal_mode")
            .fetch_one(pool.as_ref())
            .await
            .unwrap()
            .get(0);
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_pool_fails_for_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("t.db");
        let result = init_db_pool_with_path(&path, 1).await;
        assert!(matches!(result, Err(DatabaseError::SqlError(_))));
    }
}
