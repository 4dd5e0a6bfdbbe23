//! Run finalization and reporting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, InfoType, ProcessingStats, WarningType};
use crate::storage::{update_run_stats, AssetStore, RunStats};

/// Summary of a completed recovery run.
#[derive(Debug, Clone)]
pub struct RecoveryReport {
    /// Every URL claimed in the namespace, seeds included
    pub assets_discovered: usize,
    pub assets_downloaded: usize,
    pub assets_failed: usize,
    pub snippets_recovered: usize,
    /// Analysis rounds performed
    pub rounds: usize,
    /// Namespace directory holding the database and downloaded files
    pub namespace_dir: PathBuf,
    pub db_path: PathBuf,
    /// Run tag (format: `run_<timestamp_millis>` unless given)
    pub run_tag: String,
    pub elapsed_seconds: f64,
}

/// Writes final statistics, checkpoints the WAL, closes the pool and builds
/// the report.
pub(crate) async fn finalize_run(
    store: &AssetStore,
    stats: &ProcessingStats,
    rounds: usize,
    elapsed_seconds: f64,
) -> Result<RecoveryReport> {
    let summary = store
        .summary()
        .await
        .context("Failed to summarize the namespace store")?;
    let namespace = store.namespace();

    update_run_stats(
        store.pool(),
        &RunStats {
            run_tag: namespace.tag(),
            assets_discovered: summary.assets_discovered,
            assets_downloaded: summary.assets_downloaded,
            assets_failed: summary.assets_failed,
            snippets_recovered: summary.snippets_recovered,
            rounds: i64::try_from(rounds).unwrap_or(i64::MAX),
            elapsed_seconds,
        },
    )
    .await
    .context("Failed to update run statistics")?;

    if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(store.pool())
        .await
    {
        log::warn!("Failed to checkpoint WAL file (this is non-critical): {e}");
    }
    store.pool().close().await;
    log::debug!("Database pool closed");

    print_processing_statistics(stats);

    let report = RecoveryReport {
        assets_discovered: to_count(summary.assets_discovered),
        assets_downloaded: to_count(summary.assets_downloaded),
        assets_failed: to_count(summary.assets_failed),
        snippets_recovered: to_count(summary.snippets_recovered),
        rounds,
        namespace_dir: namespace.dir().to_path_buf(),
        db_path: namespace.db_path(),
        run_tag: namespace.tag().to_string(),
        elapsed_seconds,
    };
    info!(
        "Recovered {} of {} assets ({} failed, {} loader snippets) for {} in {} round{}, {:.1}s",
        report.assets_downloaded,
        report.assets_discovered,
        report.assets_failed,
        report.snippets_recovered,
        namespace.host(),
        report.rounds,
        if report.rounds == 1 { "" } else { "s" },
        report.elapsed_seconds
    );
    Ok(report)
}

fn to_count(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Logs every non-zero error, warning and info counter.
pub fn print_processing_statistics(stats: &ProcessingStats) {
    let total_errors = stats.total_errors();
    let total_warnings = stats.total_warnings();
    let total_info = stats.total_info();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_warnings > 0 {
        info!("Warning Counts ({} total):", total_warnings);
        for warning_type in WarningType::iter() {
            let count = stats.get_warning_count(warning_type);
            if count > 0 {
                info!("   {}: {}", warning_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}
