//! Fetch layer.
//!
//! Bounded-concurrency downloader for script URLs. Each URL is fetched at most
//! once per namespace: a worker first claims the URL in the store, and only
//! the worker whose claim inserted the row downloads it.
//!
//! Per URL:
//! 1. validate (http/https with host) and apply the blacklist
//! 2. claim in the store
//! 3. download with retry/backoff, reject HTML or oversized bodies
//! 4. write `<namespace>/<alias>`, mark successful, learn chunk directories
//!    and cache the first public path seen
//! 5. on a network failure, try alternates proposed by learned directories

mod blacklist;
mod candidate;
mod content;
mod context;
mod patterns;
mod request;

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use tokio_retry::RetryIf;
use url::Url;

pub use blacklist::Blacklist;
pub use candidate::validate_fetch_url;
pub use content::validate_script_body;
pub use context::FetchContext;
pub use patterns::{PathPatternRegistry, PublicPathCache};
pub use request::{parse_extra_header, RequestOptions};

use crate::config::{Config, MAX_ASSET_BODY_SIZE};
use crate::error_handling::{
    categorize_fetch_error, get_retry_strategy, ErrorType, FetchError, InfoType, ProcessingStats,
};
use crate::initialization::init_semaphore;
use crate::reconcile::find_public_path;
use crate::storage::{Asset, AssetStore};
use crate::utils::retry::{is_network_error, is_retriable_error};

/// Counts for one batch of candidate URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Candidates handed to the batch
    pub requested: usize,
    /// Assets written and marked successful (alternates included)
    pub downloaded: usize,
    /// Claimed assets whose download failed
    pub failed: usize,
    /// Candidates dropped before any network call (malformed, blacklisted,
    /// already known)
    pub skipped: usize,
}

impl FetchSummary {
    fn absorb(&mut self, other: FetchSummary) {
        self.downloaded += other.downloaded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Handle on the fetch layer; cheap to clone.
#[derive(Clone)]
pub struct Fetcher {
    ctx: Arc<FetchContext>,
}

impl Fetcher {
    pub fn new(
        config: &Config,
        client: Arc<reqwest::Client>,
        store: AssetStore,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            ctx: Arc::new(FetchContext::new(config, client, store, stats)),
        }
    }

    pub fn store(&self) -> &AssetStore {
        &self.ctx.store
    }

    /// Public path cached for the namespace, if any file declared one.
    pub async fn public_path(&self) -> Option<Url> {
        self.ctx.public_path.get().await
    }

    /// Fetches every candidate at most once, with `lineage_id` recorded on
    /// each newly claimed asset.
    ///
    /// Failures are logged, counted and recorded on the asset; they never
    /// abort sibling downloads.
    pub async fn fetch_batch<I, S>(&self, candidates: I, lineage_id: Option<i64>) -> FetchSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = FetchSummary::default();
        let mut seen = HashSet::new();
        let mut tasks = FuturesUnordered::new();
        let semaphore = init_semaphore(self.ctx.max_concurrency);

        for candidate in candidates {
            summary.requested += 1;
            let candidate = candidate.as_ref();

            let url = match validate_fetch_url(candidate) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping candidate: {e}");
                    self.ctx.stats.increment_error(ErrorType::MalformedUrl);
                    summary.skipped += 1;
                    continue;
                }
            };
            if self.ctx.blacklist.is_blocked(&url) {
                debug!("Skipping blacklisted URL {url}");
                self.ctx.stats.increment_info(InfoType::Blacklisted);
                summary.skipped += 1;
                continue;
            }
            if !seen.insert(url.clone()) {
                self.ctx.stats.increment_info(InfoType::DuplicateUrl);
                summary.skipped += 1;
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, skipping URL: {url}");
                    summary.skipped += 1;
                    continue;
                }
            };

            let ctx = Arc::clone(&self.ctx);
            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                claim_and_fetch(&ctx, url, lineage_id).await
            }));
        }

        while let Some(task_result) = tasks.next().await {
            match task_result {
                Ok(outcome) => summary.absorb(outcome),
                Err(join_error) => {
                    summary.failed += 1;
                    warn!("Download task panicked: {join_error:?}");
                }
            }
        }

        info!(
            "Fetched batch: {} requested, {} downloaded, {} failed, {} skipped",
            summary.requested, summary.downloaded, summary.failed, summary.skipped
        );
        summary
    }

    /// Persists inline script bodies found on the page as successful assets
    /// with synthetic URLs `<page url>#inline-<n>`.
    pub async fn store_inline_scripts(&self, page_url: &Url, scripts: &[String]) -> FetchSummary {
        let mut summary = FetchSummary::default();
        for (n, body) in scripts.iter().enumerate() {
            summary.requested += 1;
            let mut url = page_url.clone();
            url.set_fragment(Some(&format!("inline-{n}")));

            let asset = match self.ctx.store.claim_asset(&url, None).await {
                Ok(Some(asset)) => asset,
                Ok(None) => {
                    self.ctx.stats.increment_info(InfoType::DuplicateUrl);
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Failed to claim inline script {url}: {e}");
                    self.ctx.stats.increment_error(ErrorType::StoreWriteError);
                    summary.failed += 1;
                    continue;
                }
            };

            match persist(&self.ctx, &asset, &url, body.as_bytes()).await {
                Ok(()) => summary.downloaded += 1,
                Err(e) => {
                    record_failure(&self.ctx, &asset, &e).await;
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Claims `url` and downloads it; on a network failure, tries alternates
/// proposed by the path-pattern registry (one level, no further inference).
async fn claim_and_fetch(ctx: &FetchContext, url: Url, lineage_id: Option<i64>) -> FetchSummary {
    let mut outcome = FetchSummary::default();

    let asset = match ctx.store.claim_asset(&url, lineage_id).await {
        Ok(Some(asset)) => asset,
        Ok(None) => {
            debug!("Already known, not fetching again: {url}");
            ctx.stats.increment_info(InfoType::DuplicateUrl);
            outcome.skipped += 1;
            return outcome;
        }
        Err(e) => {
            warn!("Failed to claim {url}: {e}");
            ctx.stats.increment_error(ErrorType::StoreWriteError);
            outcome.failed += 1;
            return outcome;
        }
    };

    let error = match attempt(ctx, &asset, &url).await {
        Ok(()) => {
            outcome.downloaded += 1;
            return outcome;
        }
        Err(e) => e,
    };
    outcome.failed += 1;

    if !is_network_error(&error) {
        return outcome;
    }

    for alternate in ctx.patterns.alternates(&url).await {
        if ctx.blacklist.is_blocked(&alternate) {
            continue;
        }
        let alt_asset = match ctx.store.claim_asset(&alternate, lineage_id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => continue,
            Err(e) => {
                warn!("Failed to claim alternate {alternate}: {e}");
                continue;
            }
        };
        info!("Trying inferred path {alternate} for {url}");
        ctx.stats.increment_info(InfoType::InferredPath);
        match attempt(ctx, &alt_asset, &alternate).await {
            Ok(()) => outcome.downloaded += 1,
            Err(_) => outcome.failed += 1,
        }
    }

    outcome
}

/// Downloads, validates and persists one claimed asset. Failures are
/// counted and recorded on the asset row before being returned.
async fn attempt(ctx: &FetchContext, asset: &Asset, url: &Url) -> Result<(), FetchError> {
    let result = async {
        let body = download_with_retry(ctx, url).await?;
        validate_script_body(&body)?;
        persist(ctx, asset, url, &body).await
    }
    .await;

    if let Err(e) = &result {
        record_failure(ctx, asset, e).await;
    }
    result
}

async fn download_with_retry(ctx: &FetchContext, url: &Url) -> Result<Vec<u8>, FetchError> {
    let retry_strategy = get_retry_strategy(ctx.max_retries);
    RetryIf::spawn(
        retry_strategy,
        || download(ctx, url),
        |e: &FetchError| {
            let retry = is_retriable_error(e);
            if retry {
                debug!("Retrying {url} after: {e}");
            }
            retry
        },
    )
    .await
}

async fn download(ctx: &FetchContext, url: &Url) -> Result<Vec<u8>, FetchError> {
    let builder = ctx
        .request_options
        .apply_to_request_builder(ctx.client.get(url.clone()));
    let mut response = builder.send().await?.error_for_status()?;

    if let Some(len) = response.content_length() {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        if len > MAX_ASSET_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(len));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ASSET_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body.len()));
        }
    }
    Ok(body)
}

/// Writes the body under the asset alias and marks the asset successful;
/// then feeds the path-pattern registry and the public-path cache.
async fn persist(
    ctx: &FetchContext,
    asset: &Asset,
    url: &Url,
    body: &[u8],
) -> Result<(), FetchError> {
    let path = ctx.store.namespace().asset_path(&asset.alias);
    tokio::fs::write(&path, body).await?;
    ctx.store.mark_success(&asset.alias).await?;
    debug!("Saved {url} as {}", path.display());

    ctx.patterns.record_success(url).await;

    let text = String::from_utf8_lossy(body);
    if let Some(public_path) = find_public_path(&text) {
        if let Ok(resolved) = url.join(public_path) {
            ctx.public_path.offer(resolved).await;
        }
    }
    Ok(())
}

async fn record_failure(ctx: &FetchContext, asset: &Asset, error: &FetchError) {
    ctx.stats.increment_error(categorize_fetch_error(error));
    warn!("Failed to fetch {}: {error}", asset.remote_url);
    if let Err(e) = ctx.store.mark_failed(&asset.alias, &error.to_string()).await {
        warn!("Failed to record failure for {}: {e}", asset.remote_url);
        ctx.stats.increment_error(ErrorType::StoreWriteError);
    }
}
