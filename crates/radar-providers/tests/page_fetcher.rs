//! Integration tests for `PageFetcher::fetch`.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use radar_core::normalize_site;
use radar_providers::{PageFetcher, ProviderError};

fn test_fetcher(max_retries: u32) -> PageFetcher {
    PageFetcher::new(5, "radar-test/0.1", max_retries, 1).expect("failed to build test PageFetcher")
}

#[tokio::test]
async fn fetch_returns_body_and_lowercased_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Strict-Transport-Security", "max-age=31536000")
                .set_body_string("<html><title>Acme</title></html>"),
        )
        .mount(&server)
        .await;

    let site = normalize_site(&server.uri()).unwrap();
    let page = test_fetcher(0).fetch(&site).await.expect("fetch should succeed");

    assert_eq!(page.status, 200);
    assert!(page.final_url.starts_with(&server.uri()));
    assert_eq!(page.header("strict-transport-security"), Some("max-age=31536000"));
    assert!(page.body.contains("<title>Acme</title>"));
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let site = normalize_site(&server.uri()).unwrap();
    let err = test_fetcher(2).fetch(&site).await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn server_error_is_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let site = normalize_site(&server.uri()).unwrap();
    let err = test_fetcher(2).fetch(&site).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::UnexpectedStatus { status: 503, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn oversized_body_is_cut_at_the_cap() {
    let server = MockServer::start().await;
    let body = "a".repeat(3 * 1024 * 1024);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let site = normalize_site(&server.uri()).unwrap();
    let page = test_fetcher(0).fetch(&site).await.expect("fetch should succeed");
    assert_eq!(page.body.len(), 2 * 1024 * 1024);
}

#[tokio::test]
async fn retries_stop_at_the_fetch_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(700)))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(1, "radar-test/0.1", 3, 1).expect("fetcher");
    let site = normalize_site(&server.uri()).unwrap();
    let err = fetcher.fetch(&site).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::Timeout { provider: "page_fetch", .. }),
        "got {err:?}"
    );
}
