//! Integration tests for the fetch layer against a mock HTTP server.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use httptest::{cycle, matchers::*, responders::*, Expectation, Server};
use tempfile::TempDir;
use url::Url;

use chunk_recover::error_handling::{ErrorType, InfoType, ProcessingStats};
use chunk_recover::fetch::{FetchSummary, Fetcher};
use chunk_recover::initialization::init_client;
use chunk_recover::storage::{AssetStore, ExtractionMethod, RunNamespace};
use chunk_recover::Config;

use helpers::test_config;

async fn setup(
    server: &Server,
    config_fn: impl FnOnce(&mut Config),
) -> (TempDir, Fetcher, Arc<ProcessingStats>) {
    let tmp = TempDir::new().expect("Failed to create temp directory");
    let page = format!("http://{}/", server.addr());
    let mut config = test_config(tmp.path(), &page);
    config_fn(&mut config);

    let target = Url::parse(&page).unwrap();
    let namespace = RunNamespace::new(tmp.path(), "fetch", &target).unwrap();
    let store = AssetStore::open(namespace, 4).await.unwrap();
    let client = init_client(&config).unwrap();
    let stats = Arc::new(ProcessingStats::new());
    let fetcher = Fetcher::new(&config, client, store, Arc::clone(&stats));
    (tmp, fetcher, stats)
}

#[tokio::test]
async fn test_404_is_categorized_and_recorded() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/missing.js"))
            .respond_with(status_code(404).body("Not Found")),
    );
    let (_tmp, fetcher, stats) = setup(&server, |_| {}).await;

    let url = server.url_str("/missing.js");
    let summary = fetcher.fetch_batch([url.as_str()], None).await;
    assert_eq!(
        summary,
        FetchSummary {
            requested: 1,
            downloaded: 0,
            failed: 1,
            skipped: 0
        }
    );
    assert_eq!(stats.get_error_count(ErrorType::HttpRequestNotFound), 1);

    let asset = fetcher.store().asset_by_url(&url).await.unwrap().unwrap();
    assert!(!asset.success);
    assert!(asset.failure_reason.unwrap().contains("404"));
}

#[tokio::test]
async fn test_duplicates_and_malformed_are_skipped() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/main.js"))
            .times(1)
            .respond_with(status_code(200).body("main()")),
    );
    let (_tmp, fetcher, stats) = setup(&server, |_| {}).await;

    let url = server.url_str("/main.js");
    let batch = vec![
        url.clone(),
        url.clone(),
        "not a url".to_string(),
        "ftp://example.com/x.js".to_string(),
    ];
    let summary = fetcher.fetch_batch(&batch, None).await;
    assert_eq!(summary.requested, 4);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.skipped, 3);
    assert_eq!(stats.get_error_count(ErrorType::MalformedUrl), 2);

    // A later batch never fetches the same URL again
    let again = fetcher.fetch_batch([url.as_str()], None).await;
    assert_eq!(again.skipped, 1);
    assert!(stats.get_info_count(InfoType::DuplicateUrl) >= 2);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/flaky.js"))
            .times(2)
            .respond_with(cycle![
                status_code(503),
                status_code(200).body("ok()"),
            ]),
    );
    let (_tmp, fetcher, _stats) = setup(&server, |c| c.max_retries = 1).await;

    let summary = fetcher
        .fetch_batch([server.url_str("/flaky.js")], None)
        .await;
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_oversized_content_length_is_rejected() {
    let server = Server::run();
    let big = "x".repeat(chunk_recover::config::MAX_ASSET_BODY_SIZE + 1);
    server.expect(
        Expectation::matching(request::method_path("GET", "/huge.js"))
            .respond_with(status_code(200).body(big)),
    );
    let (_tmp, fetcher, stats) = setup(&server, |_| {}).await;

    let summary = fetcher.fetch_batch([server.url_str("/huge.js")], None).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(stats.get_error_count(ErrorType::ContentTooLarge), 1);
}

#[tokio::test]
async fn test_alternate_path_from_learned_chunk_directory() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/static/js/chunk.1.js"))
            .respond_with(status_code(200).body("one()")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/wrong/chunk.2.js"))
            .respond_with(status_code(404)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/static/js/chunk.2.js"))
            .respond_with(status_code(200).body("two()")),
    );
    let (_tmp, fetcher, stats) = setup(&server, |_| {}).await;

    let first = fetcher
        .fetch_batch([server.url_str("/static/js/chunk.1.js")], None)
        .await;
    assert_eq!(first.downloaded, 1);

    // Lineage must point at a real snippet
    let parent = fetcher
        .store()
        .asset_by_url(&server.url_str("/static/js/chunk.1.js"))
        .await
        .unwrap()
        .unwrap();
    let snippet_id = fetcher
        .store()
        .record_snippet(&parent.alias, "e", r#"e + ".js""#, ExtractionMethod::Structural)
        .await
        .unwrap();

    let second = fetcher
        .fetch_batch([server.url_str("/wrong/chunk.2.js")], Some(snippet_id))
        .await;
    assert_eq!(second.failed, 1);
    assert_eq!(second.downloaded, 1);
    assert_eq!(stats.get_info_count(InfoType::InferredPath), 1);

    let alternate = fetcher
        .store()
        .asset_by_url(&server.url_str("/static/js/chunk.2.js"))
        .await
        .unwrap()
        .expect("alternate asset");
    assert!(alternate.success);
    assert_eq!(alternate.lineage_id, Some(snippet_id));
}

#[tokio::test]
async fn test_public_path_cached_from_first_download() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/js/runtime.js"))
            .respond_with(status_code(200).body(r#"__webpack_require__.p = "/assets/";"#)),
    );
    let (_tmp, fetcher, _stats) = setup(&server, |_| {}).await;
    assert!(fetcher.public_path().await.is_none());

    fetcher
        .fetch_batch([server.url_str("/js/runtime.js")], None)
        .await;
    let cached = fetcher.public_path().await.expect("public path cached");
    assert_eq!(cached.as_str(), server.url_str("/assets/"));
}

#[tokio::test]
async fn test_long_file_name_is_saved_under_shortened_alias() {
    let server = Server::run();
    let path = format!("/{}.js", "v".repeat(250));
    server.expect(
        Expectation::matching(request::method_path("GET", path.clone()))
            .respond_with(status_code(200).body("console.log('long');")),
    );
    let (_tmp, fetcher, _stats) = setup(&server, |_| {}).await;

    let url = server.url_str(&path);
    let summary = fetcher.fetch_batch([url.as_str()], None).await;
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 0);

    let asset = fetcher.store().asset_by_url(&url).await.unwrap().unwrap();
    assert!(asset.success);
    assert!(asset.alias.len() < 255);
    assert!(asset.alias.ends_with(".js"));
    let saved = fetcher.store().namespace().asset_path(&asset.alias);
    assert_eq!(
        std::fs::read_to_string(saved).unwrap(),
        "console.log('long');"
    );
}

#[tokio::test]
async fn test_unreachable_host_fails_without_panicking() {
    let server = Server::run();
    let (_tmp, fetcher, stats) = setup(&server, |c| c.connect_timeout_secs = 1).await;

    let started = std::time::Instant::now();
    let summary = fetcher
        .fetch_batch(["http://127.0.0.1:1/app.js"], None)
        .await;
    assert_eq!(summary.failed, 1);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(stats.get_error_count(ErrorType::HttpRequestConnectError), 1);
}
