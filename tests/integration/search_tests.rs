//! Integration tests for the search pipeline
//!
//! These tests use wiremock to serve a shop home page, a results listing
//! and a collector endpoint, then run complete search requests against them.

use shelf_scout::config::{BrowserConfig, CollectorConfig, Config, ExtractionConfig, UserAgentConfig};
use shelf_scout::output::{DeliveryError, HttpCollector, JsonFileSink};
use shelf_scout::page::build_http_client;
use shelf_scout::{
    run_search, HttpPage, RunOptions, ScoutError, SearchFailure, SearchRequest, SiteId,
    SiteRegistry,
};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME_PAGE: &str = r#"
<html><body>
  <form name="site-search" action="/s" method="get">
    <input type="hidden" name="i" value="aps">
    <input type="text" name="field-keywords" value="">
    <input type="submit" value="Go">
  </form>
</body></html>
"#;

/// Three cards: no price, full match, name missing a query word
const LISTING_PAGE: &str = r#"
<html><body>
  <div class="s-card-container">
    <img class="s-image" src="https://m.media-amazon.com/images/I/1.jpg">
    <h2><a href="/1"><span>AMD Ryzen 9 3950X (Renewed)</span></a></h2>
    <a class="a-link-normal s-no-hover s-underline-text s-underline-link-text s-link-style a-text-normal"
       href="/AMD-Ryzen-3950X-Renewed/dp/B08/ref=sr_1_1?keywords=ryzen">x</a>
  </div>
  <div class="s-card-container">
    <img class="s-image" src="https://m.media-amazon.com/images/I/2.jpg">
    <h2><a href="/2"><span>AMD Ryzen 9 3950X 16-Core Processor</span></a></h2>
    <span class="a-price"><span class="a-offscreen">$1,034.99</span></span>
    <a class="a-link-normal s-no-hover s-underline-text s-underline-link-text s-link-style a-text-normal"
       href="/AMD-Ryzen-3950X-Processor/dp/B07ZTYKLCY/ref=sr_1_2?keywords=ryzen">x</a>
  </div>
  <div class="s-card-container">
    <img class="s-image" src="https://m.media-amazon.com/images/I/3.jpg">
    <h2><a href="/3"><span>AMD Ryzen 7 5800X Processor</span></a></h2>
    <span class="a-price"><span class="a-offscreen">$399.00</span></span>
    <a class="a-link-normal s-no-hover s-underline-text s-underline-link-text s-link-style a-text-normal"
       href="/AMD-Ryzen-5800X/dp/B0815XFSGK/ref=sr_1_3?keywords=ryzen">x</a>
  </div>
</body></html>
"#;

/// Creates a test configuration pointing the collector at `base_url`
fn create_test_config(base_url: &str) -> Config {
    Config {
        browser: BrowserConfig {
            navigation_timeout_ms: 5_000,
            selector_timeout_ms: 300,
            load_timeout_ms: 2_000,
        },
        extraction: ExtractionConfig { max_concurrency: 2 },
        collector: CollectorConfig {
            base_url: base_url.to_string(),
            results_path: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Mounts the home page and the listing for `ryzen 9 3950x`
async fn mount_shop(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME_PAGE))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("field-keywords", "ryzen 9 3950x"))
        .and(query_param("i", "aps"))
        .respond_with(html(LISTING_PAGE))
        .mount(server)
        .await;
}

struct Harness {
    page: HttpPage,
    collector: HttpCollector,
    options: RunOptions,
}

fn harness(server: &MockServer) -> Harness {
    let config = create_test_config(&server.uri());
    let client = build_http_client(&config.user_agent).expect("Failed to build client");

    Harness {
        page: HttpPage::new(client.clone(), config.browser.navigation_timeout()),
        collector: HttpCollector::new(client, &config.collector.base_url),
        options: RunOptions::from_config(&config).with_start_url(format!("{}/", server.uri())),
    }
}

fn ryzen_request() -> SearchRequest {
    SearchRequest::parse("amazon.ca", "ryzen 9 3950x", "/results").expect("Known site")
}

#[tokio::test]
async fn test_end_to_end_only_full_match_is_delivered() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    Mock::given(method("POST"))
        .and(path("/results"))
        .and(body_json(serde_json::json!({
            "data": [{
                "img": "https://m.media-amazon.com/images/I/2.jpg",
                "name": "AMD Ryzen 9 3950X 16-Core Processor",
                "price": 1034.99,
                "url": "/AMD-Ryzen-3950X-Processor/dp/B07ZTYKLCY/ref=sr_1_2"
            }],
            "search_text": "ryzen 9 3950x",
            "source": "amazon.ca"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let report = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .expect("Search should succeed");

    assert_eq!(report.site, SiteId::AmazonCa);
    assert_eq!(report.stats.matched, 3);
    assert_eq!(report.stats.accepted, 1);
    assert_eq!(report.stats.rejected, 2);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.batch.len(), 1);
    assert_eq!(report.delivery.as_ref().unwrap().status_code, 201);
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_collector_failure_is_reported_not_fatal() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    Mock::given(method("POST"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let report = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .expect("Extraction should still complete");

    assert!(!report.delivered());
    assert!(matches!(
        report.delivery,
        Err(DeliveryError::Status { status: 500, .. })
    ));
    assert_eq!(report.batch.len(), 1);
}

#[tokio::test]
async fn test_results_file_written_alongside_delivery() {
    let server = MockServer::start().await;
    mount_shop(&server).await;
    Mock::given(method("POST"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let h = harness(&server);
    let report = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .unwrap();

    let dir = TempDir::new().unwrap();
    let sink = JsonFileSink::new(dir.path().join("results.json"));
    sink.save(&report.batch.products).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sink.path()).unwrap()).unwrap();
    assert_eq!(written["results"].as_array().unwrap().len(), 1);
    assert_eq!(written["results"][0]["price"], 1034.99);
}

#[tokio::test]
async fn test_missing_search_field_aborts_before_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body><p>Under maintenance</p></body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ScoutError::SearchStage {
            reason: SearchFailure::SearchFieldNotFound,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_results_page_is_submit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ScoutError::SearchStage {
            reason: SearchFailure::SubmitError,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_start_page_is_navigation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ScoutError::Navigation { .. }));
}

#[tokio::test]
async fn test_empty_listing_delivers_empty_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html("<html><body>No results for your search.</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/results"))
        .and(body_json(serde_json::json!({
            "data": [],
            "search_text": "ryzen 9 3950x",
            "source": "amazon.ca"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let report = run_search(
        &ryzen_request(),
        &SiteRegistry::builtin(),
        &h.page,
        &h.collector,
        &h.options,
    )
    .await
    .unwrap();

    assert_eq!(report.stats.matched, 0);
    assert!(report.batch.is_empty());
    assert!(report.delivered());
}

#[test]
fn test_unknown_site_request() {
    let err = SearchRequest::parse("walmart.ca", "ryzen", "/results").unwrap_err();
    assert!(matches!(err, ScoutError::UnknownSite(ref site) if site == "walmart.ca"));
}
