//! Run metadata insertion.
//!
//! This module handles inserting and updating run-level metadata and statistics.

use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Metadata for a recovery run, recorded at start.
pub struct RunMetadata<'a> {
    pub run_tag: &'a str,
    pub host: &'a str,
    pub version: &'a str,
    pub start_time_ms: i64,
}

/// Statistics for a completed run, recorded at end.
pub struct RunStats<'a> {
    pub run_tag: &'a str,
    pub assets_discovered: i64,
    pub assets_downloaded: i64,
    pub assets_failed: i64,
    pub snippets_recovered: i64,
    pub rounds: i64,
    pub elapsed_seconds: f64,
}

/// Inserts or updates run metadata in the runs table.
///
/// Re-running with the same tag (a resumed run) resets the start time.
pub async fn insert_run_metadata(
    pool: &SqlitePool,
    meta: &RunMetadata<'_>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO runs (run_tag, host, version, start_time_ms)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(run_tag) DO UPDATE SET
             host=excluded.host,
             version=excluded.version,
             start_time_ms=excluded.start_time_ms",
    )
    .bind(meta.run_tag)
    .bind(meta.host)
    .bind(meta.version)
    .bind(meta.start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Updates run statistics when a run completes.
pub async fn update_run_stats(pool: &SqlitePool, stats: &RunStats<'_>) -> Result<(), DatabaseError> {
    let end_time_ms = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE runs
         SET end_time_ms = ?, assets_discovered = ?, assets_downloaded = ?, assets_failed = ?,
             snippets_recovered = ?, rounds = ?, elapsed_seconds = ?
         WHERE run_tag = ?",
    )
    .bind(end_time_ms)
    .bind(stats.assets_discovered)
    .bind(stats.assets_downloaded)
    .bind(stats.assets_failed)
    .bind(stats.snippets_recovered)
    .bind(stats.rounds)
    .bind(stats.elapsed_seconds)
    .bind(stats.run_tag)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::create_test_store;
    use sqlx::Row;

    #[tokio::test]
    async fn test_run_metadata_and_stats() {
        let (_tmp, store) = create_test_store().await;
        let pool = store.pool();

        insert_run_metadata(
            pool,
            &RunMetadata {
                run_tag: "run_1",
                host: "a.com",
                version: "0.1.0",
                start_time_ms: 1_704_067_200_000,
            },
        )
        .await
        .unwrap();

        update_run_stats(
            pool,
            &RunStats {
                run_tag: "run_1",
                assets_discovered: 5,
                assets_downloaded: 4,
                assets_failed: 1,
                snippets_recovered: 2,
                rounds: 3,
                elapsed_seconds: 1.5,
            },
        )
        .await
        .unwrap();

        let row = sqlx::query(
            "SELECT host, assets_downloaded, rounds, end_time_ms FROM runs WHERE run_tag = ?",
        )
        .bind("run_1")
        .fetch_one(pool)
        .await
        .unwrap();
        assert_eq!(row.get::<String, _>("host"), "a.com");
        assert_eq!(row.get::<i64, _>("assets_downloaded"), 4);
        assert_eq!(row.get::<i64, _>("rounds"), 3);
        assert!(row.get::<Option<i64>, _>("end_time_ms").is_some());
    }

    #[tokio::test]
    async fn test_insert_run_metadata_upserts() {
        let (_tmp, store) = create_test_store().await;
        let pool = store.pool();
        for start in [1, 2] {
            insert_run_metadata(
                pool,
                &RunMetadata {
                    run_tag: "again",
                    host: "a.com",
                    version: "0.1.0",
                    start_time_ms: start,
                },
            )
            .await
            .unwrap();
        }
        let start: i64 = sqlx::query_scalar("SELECT start_time_ms FROM runs WHERE run_tag = 'again'")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(start, 2);
    }
}
