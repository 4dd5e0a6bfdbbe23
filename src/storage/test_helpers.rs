//! Shared test helpers for storage module tests.

use tempfile::TempDir;
use url::Url;

use super::models::Asset;
use super::namespace::RunNamespace;
use super::store::AssetStore;

/// Opens a store in a fresh temporary directory.
///
/// The `TempDir` must be kept alive for as long as the store is used.
pub async fn create_test_store() -> (TempDir, AssetStore) {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let target = Url::parse("https://app.example.com/").expect("valid URL");
    let namespace =
        RunNamespace::new(tmp.path(), "test", &target).expect("Failed to build namespace");
    let store = AssetStore::open(namespace, 4)
        .await
        .expect("Failed to open test store");
    (tmp, store)
}

/// Claims `url` and marks it successful.
pub async fn create_successful_asset(store: &AssetStore, url: &str) -> Asset {
    let url = Url::parse(url).expect("valid URL");
    let mut asset = store
        .claim_asset(&url, None)
        .await
        .expect("Failed to claim asset")
        .expect("URL already claimed");
    store
        .mark_success(&asset.alias)
        .await
        .expect("Failed to mark asset successful");
    asset.success = true;
    asset
}
