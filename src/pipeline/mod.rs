//! Recovery pipeline.
//!
//! Round-based driver over the components:
//! 1. round zero fetches the seeds (and stores inline scripts)
//! 2. each analysis round takes every successful asset not yet analyzed,
//!    extracts and evaluates its loaders, records one snippet per loader and
//!    fetches the reconciled chunk URLs with that snippet as lineage
//! 3. the loop ends when a round discovers nothing new or the round cap is hit
//!
//! Termination on cyclic graphs follows from two facts: a file is analyzed
//! once (Processed-set) and a URL is fetched once (atomic claim in the store).

mod analyze;
mod report;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use url::Url;

pub use report::{print_processing_statistics, RecoveryReport};

use crate::config::Config;
use crate::error_handling::{ErrorType, InfoType, ProcessingStats, WarningType};
use crate::fetch::Fetcher;
use crate::initialization::init_client;
use crate::reconcile::{reconcile, resolution_base, ChunkUrl};
use crate::seed::SeedSet;
use crate::storage::{
    default_run_tag, insert_run_metadata, Asset, AssetStore, ExtractionMethod, RunMetadata,
    RunNamespace,
};

use analyze::{analyze_source, FileAnalysis};

/// Runs chunk recovery for one target.
///
/// Fetches the seeds, then repeatedly analyzes newly downloaded files and
/// fetches the chunks their loaders reveal, until nothing new turns up or
/// `config.max_rounds` analysis rounds have run.
///
/// # Errors
///
/// Only setup failures surface here: the namespace directory or database
/// cannot be created, or the HTTP client cannot be built. Per-URL and
/// per-file failures are logged and counted instead.
pub async fn run_recovery(config: Config, seeds: SeedSet) -> Result<RecoveryReport> {
    let start_time = Instant::now();

    let run_tag = config.run_tag.clone().unwrap_or_else(default_run_tag);
    let namespace = RunNamespace::new(&config.output_dir, &run_tag, &seeds.page_url)
        .context("Failed to derive run namespace")?;
    info!("Namespace directory: {}", namespace.dir().display());

    let pool_size = u32::try_from(config.max_concurrency.max(1)).unwrap_or(u32::MAX);
    let store = AssetStore::open(namespace, pool_size)
        .await
        .context("Failed to open namespace store")?;
    let client = init_client(&config).context("Failed to initialize HTTP client")?;
    let stats = Arc::new(ProcessingStats::new());
    let fetcher = Fetcher::new(&config, client, store.clone(), Arc::clone(&stats));

    insert_run_metadata(
        store.pool(),
        &RunMetadata {
            run_tag: &run_tag,
            host: store.namespace().host(),
            version: env!("CARGO_PKG_VERSION"),
            start_time_ms: chrono::Utc::now().timestamp_millis(),
        },
    )
    .await
    .context("Failed to insert run metadata")?;

    if !seeds.inline_scripts.is_empty() {
        fetcher
            .store_inline_scripts(&seeds.page_url, &seeds.inline_scripts)
            .await;
    }
    let seed_urls = seeds.resolved_scripts();
    info!("Fetching {} seed scripts", seed_urls.len());
    fetcher.fetch_batch(&seed_urls, None).await;

    let mut processed: HashSet<PathBuf> = HashSet::new();
    let mut rounds = 0usize;
    loop {
        let pending = match unprocessed_assets(&store, &processed).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Failed to list downloaded assets, stopping: {e:#}");
                break;
            }
        };
        if pending.is_empty() {
            debug!("No unanalyzed assets left after {rounds} rounds");
            break;
        }
        if config.round_limit().is_some_and(|limit| rounds >= limit) {
            info!(
                "Round cap of {rounds} reached with {} files not analyzed",
                pending.len()
            );
            break;
        }
        rounds += 1;
        info!("Round {rounds}: analyzing {} files", pending.len());

        let mut discovered: Vec<Vec<ChunkUrl>> = Vec::new();
        for asset in pending {
            processed.insert(store.namespace().asset_path(&asset.alias));
            discovered.extend(analyze_asset(&fetcher, &stats, &asset).await);
        }

        let mut requested = 0;
        for chunks in discovered {
            let Some(snippet_id) = chunks.first().map(|c| c.snippet_id) else {
                continue;
            };
            requested += chunks.len();
            let urls: Vec<String> = chunks.into_iter().map(|c| c.url.into()).collect();
            fetcher.fetch_batch(&urls, Some(snippet_id)).await;
        }
        info!("Round {rounds}: {requested} chunk URLs requested");
    }

    report::finalize_run(&store, &stats, rounds, start_time.elapsed().as_secs_f64()).await
}

/// Successful assets whose local file has not been analyzed yet.
async fn unprocessed_assets(
    store: &AssetStore,
    processed: &HashSet<PathBuf>,
) -> Result<Vec<Asset>> {
    let assets = store
        .successful_assets()
        .await
        .context("Failed to query successful assets")?;
    Ok(assets
        .into_iter()
        .filter(|a| !processed.contains(&store.namespace().asset_path(&a.alias)))
        .collect())
}

/// Analyzes one downloaded file and returns the chunk URLs of each loader
/// found in it, grouped by the snippet recorded for that loader.
async fn analyze_asset(
    fetcher: &Fetcher,
    stats: &ProcessingStats,
    asset: &Asset,
) -> Vec<Vec<ChunkUrl>> {
    let store = fetcher.store();
    let path = store.namespace().asset_path(&asset.alias);
    let asset_url = match Url::parse(&asset.remote_url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Stored URL '{}' does not parse: {e}", asset.remote_url);
            return Vec::new();
        }
    };
    let content = match tokio::fs::read(&path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            return Vec::new();
        }
    };

    let label = asset.alias.clone();
    let (analysis, content) = match tokio::task::spawn_blocking(move || {
        let analysis = analyze_source(&label, &content);
        (analysis, content)
    })
    .await
    {
        Ok(result) => result,
        Err(join_error) => {
            warn!("Analysis of {} panicked: {join_error:?}", asset.alias);
            stats.increment_error(ErrorType::SandboxError);
            return Vec::new();
        }
    };

    let FileAnalysis {
        loaders,
        parse_failed,
        oversized,
    } = analysis;
    if parse_failed {
        stats.increment_warning(WarningType::ParseFailure);
    }
    for _ in 0..oversized {
        stats.increment_info(InfoType::OversizedSnippet);
    }
    if loaders.is_empty() {
        stats.increment_info(InfoType::NoLoader);
        return Vec::new();
    }

    let cached_public_path = fetcher.public_path().await;
    let mut out = Vec::new();
    for resolved in loaders {
        let loader = resolved.loader;
        stats.increment_info(match loader.method {
            ExtractionMethod::Structural => InfoType::StructuralLoader,
            ExtractionMethod::Regex => InfoType::RegexLoader,
        });

        let snippet_id = match store
            .record_snippet(&asset.alias, &loader.parameter, &loader.expression, loader.method)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to record loader snippet for {}: {e}", asset.alias);
                stats.increment_error(ErrorType::StoreWriteError);
                continue;
            }
        };

        let resolution = match resolved.resolution {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("Loader in {} could not be evaluated: {e}", asset.remote_url);
                stats.increment_error(ErrorType::SandboxError);
                continue;
            }
        };
        for _ in 0..resolution.failed_calls {
            stats.increment_warning(WarningType::CandidateEvalFailure);
        }
        if resolution.names.is_empty() {
            debug!("Loader in {} resolved no file names", asset.remote_url);
            continue;
        }

        let base = resolution_base(&asset_url, &content, cached_public_path.as_ref(), stats);
        debug!("Resolving chunks of {} against {} ({:?})", asset.alias, base.url, base.source);
        let chunks = reconcile(
            &base.url,
            resolution.names.iter().map(String::as_str),
            snippet_id,
            stats,
        );
        info!(
            "{}: {} loader yielded {} chunk URLs",
            asset.remote_url,
            loader.method,
            chunks.len()
        );
        out.push(chunks);
    }
    out
}
