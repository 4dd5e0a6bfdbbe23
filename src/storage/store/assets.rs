//! Asset rows: atomic claim, success/failure marking, lookups.

use log::debug;
use rand::distr::Alphanumeric;
use rand::Rng;
use url::Url;

use super::AssetStore;
use crate::config::ALIAS_TAG_LENGTH;
use crate::error_handling::DatabaseError;
use crate::storage::models::Asset;
use crate::utils::sanitize::{sanitize_and_truncate_error_message, sanitize_file_name};

// A random tag collision on the alias primary key is retried with a fresh tag
const MAX_ALIAS_ATTEMPTS: usize = 4;

const ASSET_COLUMNS: &str =
    "alias, name, remote_url, lineage_id, success, failure_reason, created_at_ms";

/// File name an asset is stored under (before the alias tag).
///
/// The last path segment of the URL; inline-script URLs
/// (`<page>#inline-<n>`) become `inline-<n>.js`.
pub fn asset_file_name(url: &Url) -> String {
    if let Some(fragment) = url.fragment().filter(|f| f.starts_with("inline-")) {
        return sanitize_file_name(&format!("{fragment}.js"));
    }
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    sanitize_file_name(last)
}

fn random_tag() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ALIAS_TAG_LENGTH)
        .map(char::from)
        .collect()
}

impl AssetStore {
    /// Atomically claims `url` for download.
    ///
    /// Inserts a pending row with `ON CONFLICT(remote_url) DO NOTHING`; the
    /// caller whose insert affected a row owns the download and receives the
    /// new `Asset`. `Ok(None)` means the URL is already known.
    pub async fn claim_asset(
        &self,
        url: &Url,
        lineage_id: Option<i64>,
    ) -> Result<Option<Asset>, DatabaseError> {
        let name = asset_file_name(url);
        let remote_url = url.as_str();
        let created_at_ms = chrono::Utc::now().timestamp_millis();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let alias = format!("{}.{}", random_tag(), name);
            let result = sqlx::query(
                "INSERT INTO assets (alias, name, remote_url, lineage_id, success, created_at_ms)
                 VALUES (?, ?, ?, ?, 0, ?)
                 ON CONFLICT(remote_url) DO NOTHING",
            )
            .bind(&alias)
            .bind(&name)
            .bind(remote_url)
            .bind(lineage_id)
            .bind(created_at_ms)
            .execute(self.pool())
            .await;

            match result {
                Ok(done) if done.rows_affected() == 1 => {
                    return Ok(Some(Asset {
                        alias,
                        name,
                        remote_url: remote_url.to_string(),
                        lineage_id,
                        success: false,
                        failure_reason: None,
                        created_at_ms,
                    }));
                }
                Ok(_) => return Ok(None),
                Err(sqlx::Error::Database(db_err))
                    if db_err.is_unique_violation() && attempt < MAX_ALIAS_ATTEMPTS =>
                {
                    debug!("Alias collision for {alias}, retrying with a new tag");
                }
                Err(e) => return Err(DatabaseError::SqlError(e)),
            }
        }
    }

    /// Marks a pending asset successful. Returns `false` if the asset was
    /// already successful or does not exist.
    pub async fn mark_success(&self, alias: &str) -> Result<bool, DatabaseError> {
        let done = sqlx::query(
            "UPDATE assets SET success = 1, failure_reason = NULL
             WHERE alias = ? AND success = 0",
        )
        .bind(alias)
        .execute(self.pool())
        .await?;
        Ok(done.rows_affected() == 1)
    }

    /// Records why a pending asset could not be downloaded.
    ///
    /// Successful assets are immutable; the update is a no-op for them.
    pub async fn mark_failed(&self, alias: &str, reason: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE assets SET failure_reason = ? WHERE alias = ? AND success = 0")
            .bind(sanitize_and_truncate_error_message(reason))
            .bind(alias)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn asset_by_url(&self, url: &str) -> Result<Option<Asset>, DatabaseError> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE remote_url = ?"
        ))
        .bind(url)
        .fetch_optional(self.pool())
        .await?;
        Ok(asset)
    }

    pub async fn asset_by_alias(&self, alias: &str) -> Result<Option<Asset>, DatabaseError> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE alias = ?"
        ))
        .bind(alias)
        .fetch_optional(self.pool())
        .await?;
        Ok(asset)
    }

    /// All successfully downloaded assets, oldest first.
    pub async fn successful_assets(&self) -> Result<Vec<Asset>, DatabaseError> {
        let assets = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE success = 1
             ORDER BY created_at_ms, rowid"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(assets)
    }

    /// Assets discovered through the given snippet.
    pub async fn children_of(&self, snippet_id: i64) -> Result<Vec<Asset>, DatabaseError> {
        let assets = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE lineage_id = ?
             ORDER BY remote_url"
        ))
        .bind(snippet_id)
        .fetch_all(self.pool())
        .await?;
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::create_test_store;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_asset_file_name() {
        assert_eq!(
            asset_file_name(&url("https://a.com/static/js/app.abc.js?v=1")),
            "app.abc.js"
        );
        assert_eq!(asset_file_name(&url("https://a.com/")), "index.js");
        assert_eq!(
            asset_file_name(&url("https://a.com/login#inline-3")),
            "inline-3.js"
        );
    }

    #[tokio::test]
    async fn test_claim_asset_is_at_most_once() {
        let (_tmp, store) = create_test_store().await;
        let u = url("https://a.com/static/a.js");

        let first = store.claim_asset(&u, None).await.unwrap();
        let second = store.claim_asset(&u, None).await.unwrap();

        let asset = first.expect("first claim owns the download");
        assert!(second.is_none());
        assert!(asset.alias.ends_with(".a.js"));
        assert_eq!(asset.alias.len(), ALIAS_TAG_LENGTH + 1 + "a.js".len());
        assert!(!asset.success);
    }

    #[tokio::test]
    async fn test_concurrent_claims_have_one_winner() {
        let (_tmp, store) = create_test_store().await;
        let u = url("https://a.com/static/race.js");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let u = u.clone();
            handles.push(tokio::spawn(async move { store.claim_asset(&u, None).await }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_success_is_immutable() {
        let (_tmp, store) = create_test_store().await;
        let asset = store
            .claim_asset(&url("https://a.com/x.js"), None)
            .await
            .unwrap()
            .unwrap();

        assert!(store.mark_success(&asset.alias).await.unwrap());
        assert!(!store.mark_success(&asset.alias).await.unwrap());

        store.mark_failed(&asset.alias, "late failure").await.unwrap();
        let stored = store.asset_by_alias(&asset.alias).await.unwrap().unwrap();
        assert!(stored.success);
        assert_eq!(stored.failure_reason, None);
    }

    #[tokio::test]
    async fn test_mark_failed_records_reason() {
        let (_tmp, store) = create_test_store().await;
        let asset = store
            .claim_asset(&url("https://a.com/gone.js"), None)
            .await
            .unwrap()
            .unwrap();
        store.mark_failed(&asset.alias, "404\x00 Not Found").await.unwrap();

        let stored = store
            .asset_by_url("https://a.com/gone.js")
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.success);
        assert_eq!(stored.failure_reason.as_deref(), Some("404 Not Found"));

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.assets_discovered, 1);
        assert_eq!(summary.assets_downloaded, 0);
        assert_eq!(summary.assets_failed, 1);
    }

    #[tokio::test]
    async fn test_successful_assets_excludes_pending() {
        let (_tmp, store) = create_test_store().await;
        let ok = store
            .claim_asset(&url("https://a.com/ok.js"), None)
            .await
            .unwrap()
            .unwrap();
        store
            .claim_asset(&url("https://a.com/pending.js"), None)
            .await
            .unwrap();
        store.mark_success(&ok.alias).await.unwrap();

        let assets = store.successful_assets().await.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].remote_url, "https://a.com/ok.js");
    }
}
