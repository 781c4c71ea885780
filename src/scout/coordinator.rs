//! Request coordinator - one search from start page to delivery
//!
//! This module runs a single request end to end:
//! - Resolving the site adapter
//! - Navigating to the site's start page
//! - Driving the search form until the listing is ready
//! - Extracting and filtering products
//! - Handing the batch to the result sink

use crate::config::{BrowserConfig, Config};
use crate::extract::SearchTerms;
use crate::output::{DeliveryError, DeliveryOutcome, ResultBatch, ResultSink};
use crate::page::PageSession;
use crate::scout::orchestrator::{extract_listing_with_stats, ExtractionOptions, ExtractionStats};
use crate::search::{SearchController, SearchTimeouts};
use crate::site::{SiteId, SiteRegistry};
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One user request: what to search, where, and where to send results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub site: SiteId,

    /// Query text as entered; also sent as the batch's `search_text`
    pub query: String,

    /// Collector route the batch is posted to
    pub response_route: String,
}

impl SearchRequest {
    pub fn new(site: SiteId, query: impl Into<String>, response_route: impl Into<String>) -> Self {
        Self {
            site,
            query: query.into(),
            response_route: response_route.into(),
        }
    }

    /// Builds a request from a raw site identifier
    ///
    /// # Returns
    ///
    /// * `Ok(SearchRequest)` - The site is known
    /// * `Err(ScoutError::UnknownSite)` - The site identifier is not supported
    pub fn parse(site: &str, query: &str, response_route: &str) -> Result<Self, ScoutError> {
        Ok(Self::new(site.parse()?, query, response_route))
    }

    /// Whitespace-separated words of the query, lowercased
    pub fn words(&self) -> Vec<String> {
        self.terms().words().to_vec()
    }

    pub fn terms(&self) -> SearchTerms {
        SearchTerms::from_query(&self.query)
    }
}

/// Settings for one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub browser: BrowserConfig,
    pub extraction: ExtractionOptions,

    /// Overrides the adapter's home URL as the search start page
    pub start_url: Option<String>,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            browser: config.browser.clone(),
            extraction: ExtractionOptions::default()
                .with_max_concurrency(config.extraction.max_concurrency as usize),
            start_url: None,
        }
    }

    pub fn with_start_url(mut self, start_url: impl Into<String>) -> Self {
        self.start_url = Some(start_url.into());
        self
    }
}

/// Everything that happened during one request
#[derive(Debug)]
pub struct RunReport {
    pub site: SiteId,
    pub search_text: String,
    pub route: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: ExtractionStats,

    /// The batch handed to the sink
    pub batch: ResultBatch,

    /// What the sink reported; failures are not retried
    pub delivery: Result<DeliveryOutcome, DeliveryError>,
}

impl RunReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn delivered(&self) -> bool {
        self.delivery.is_ok()
    }
}

/// Runs one search request on `session`
///
/// Failures before delivery (unknown site, navigation, any search stage, a
/// failed listing query, cancellation) abort the request without delivering
/// anything. Element failures are contained by the orchestrator. A delivery
/// failure is logged and recorded in the report.
///
/// # Returns
///
/// * `Ok(RunReport)` - Extraction ran and delivery was attempted
/// * `Err(ScoutError)` - The request was aborted before delivery
pub async fn run_search(
    request: &SearchRequest,
    registry: &SiteRegistry,
    session: &dyn PageSession,
    sink: &dyn ResultSink,
    options: &RunOptions,
) -> Result<RunReport, ScoutError> {
    let started_at = Utc::now();
    let adapter = registry.resolve(request.site)?;

    let start_url = options
        .start_url
        .clone()
        .unwrap_or_else(|| adapter.home_url().to_string());
    tracing::info!(
        "Searching {} for '{}' starting at {}",
        request.site,
        request.query,
        start_url
    );

    session
        .goto(&start_url, options.browser.navigation_timeout())
        .await
        .map_err(|source| {
            tracing::error!("Could not open {}: {}", start_url, source);
            ScoutError::Navigation {
                url: start_url.clone(),
                source,
            }
        })?;

    let mut controller = SearchController::new(
        session,
        adapter.selectors(),
        SearchTimeouts::from_config(&options.browser),
    );
    controller.run(&request.query).await?;

    let extraction = extract_listing_with_stats(
        Some(session),
        adapter.selectors().product_container,
        Arc::clone(&adapter),
        &request.terms(),
        &options.extraction,
    )
    .await
    .map_err(|source| ScoutError::Listing {
        selector: adapter.selectors().product_container.to_string(),
        source,
    })?;

    let interrupted = options
        .extraction
        .cancel
        .as_ref()
        .is_some_and(|cancel| cancel.is_cancelled());
    if interrupted || extraction.stats.cancelled > 0 {
        tracing::warn!(
            "Extraction cancelled; discarding {} finished products",
            extraction.products.len()
        );
        return Err(ScoutError::Cancelled {
            matched: extraction.stats.matched,
            cancelled: extraction.stats.cancelled,
        });
    }

    let batch = ResultBatch::new(extraction.products, request.query.clone(), adapter.id());
    let delivery = sink.deliver(&batch, &request.response_route).await;
    match &delivery {
        Ok(outcome) => tracing::info!(
            "Delivered {} products to {} (HTTP {})",
            batch.len(),
            request.response_route,
            outcome.status_code
        ),
        Err(e) => tracing::warn!("Delivery failed: {}", e),
    }

    Ok(RunReport {
        site: request.site,
        search_text: request.query.clone(),
        route: request.response_route.clone(),
        started_at,
        finished_at: Utc::now(),
        stats: extraction.stats,
        batch,
        delivery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{HttpPage, PageError};
    use crate::search::SearchFailure;
    use crate::site::{FieldSelectors, SiteAdapter, SiteSelectors};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    /// Sink that records every batch it is handed
    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<(ResultBatch, String)>>,
    }

    #[async_trait]
    impl ResultSink for RecordingSink {
        async fn deliver(
            &self,
            batch: &ResultBatch,
            route: &str,
        ) -> Result<DeliveryOutcome, DeliveryError> {
            self.batches.lock().push((batch.clone(), route.to_string()));
            Ok(DeliveryOutcome { status_code: 200 })
        }
    }

    fn fast_options() -> RunOptions {
        RunOptions {
            browser: BrowserConfig {
                navigation_timeout_ms: 1_000,
                selector_timeout_ms: 100,
                load_timeout_ms: 1_000,
            },
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_request_words() {
        let request = SearchRequest::parse("amazon.ca", "Ryzen  9 3950X", "/results").unwrap();
        assert_eq!(request.site, SiteId::AmazonCa);
        assert_eq!(request.words(), ["ryzen", "9", "3950x"]);
    }

    #[test]
    fn test_request_unknown_site() {
        let err = SearchRequest::parse("ebay.ca", "ryzen", "/results").unwrap_err();
        assert!(matches!(err, ScoutError::UnknownSite(_)));
    }

    #[test]
    fn test_options_from_config() {
        let config = crate::config::parse_config(
            r#"
            [extraction]
            max-concurrency = 4

            [collector]
            base-url = "http://localhost:5000"

            [user-agent]
            crawler-name = "ShelfScout"
            crawler-version = "0.1.0"
            contact-url = "https://example.com/about"
            contact-email = "admin@example.com"
            "#,
        )
        .unwrap();

        let options = RunOptions::from_config(&config);
        assert_eq!(options.extraction.max_concurrency, 4);
        assert_eq!(options.browser.load_timeout_ms, 60_000);
        assert!(options.start_url.is_none());
    }

    #[tokio::test]
    async fn test_unregistered_site_does_no_work() {
        let page = HttpPage::from_html("https://amazon.ca/", "<p></p>").unwrap();
        let sink = RecordingSink::default();
        let registry = SiteRegistry::from_adapters(Vec::new());
        let request = SearchRequest::new(SiteId::AmazonCa, "ryzen", "/results");

        let err = run_search(&request, &registry, &page, &sink, &fast_options())
            .await
            .unwrap_err();

        assert!(matches!(err, ScoutError::UnknownSite(_)));
        assert!(sink.batches.lock().is_empty());
    }

    #[tokio::test]
    async fn test_offline_page_cannot_navigate() {
        let page = HttpPage::from_html("https://amazon.ca/", "<p></p>").unwrap();
        let sink = RecordingSink::default();
        let request = SearchRequest::new(SiteId::AmazonCa, "ryzen", "/results");

        let err = run_search(
            &request,
            &SiteRegistry::builtin(),
            &page,
            &sink,
            &fast_options(),
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, ScoutError::Navigation { ref url, .. } if url == "https://amazon.ca")
        );
        assert!(sink.batches.lock().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_skips_extraction_and_delivery() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw("<html><body>No search here</body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let page = HttpPage::new(reqwest::Client::new(), std::time::Duration::from_secs(5));
        let sink = RecordingSink::default();
        let request = SearchRequest::new(SiteId::AmazonCa, "ryzen", "/results");
        let options = fast_options().with_start_url(format!("{}/", server.uri()));

        let err = run_search(&request, &SiteRegistry::builtin(), &page, &sink, &options)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScoutError::SearchStage {
                reason: SearchFailure::SearchFieldNotFound,
                ..
            }
        ));
        assert!(sink.batches.lock().is_empty());
    }

    const SHOP_HOME: &str = r#"
        <html><body>
            <form action="/s" method="get">
                <input type="text" name="field-keywords">
                <input type="submit" value="Go">
            </form>
        </body></html>
    "#;

    const SHOP_LISTING: &str = r#"
        <html><body>
            <div class="s-card-container">
                <h2><a href="/1"><span>AMD Ryzen 9 3950X</span></a></h2>
                <span class="a-offscreen">$999.00</span>
                <a class="a-link-normal s-no-hover s-underline-text s-underline-link-text s-link-style a-text-normal"
                   href="/AMD/dp/B07/ref=sr_1_1">x</a>
            </div>
        </body></html>
    "#;

    /// Serves a home page with the search form and a one-card listing
    async fn mount_shop() -> wiremock::MockServer {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SHOP_HOME, "text/html"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SHOP_LISTING, "text/html"))
            .mount(&server)
            .await;
        server
    }

    fn live_page() -> HttpPage {
        HttpPage::new(reqwest::Client::new(), std::time::Duration::from_secs(5))
    }

    /// Amazon search form with a container selector that cannot parse
    struct BrokenListing;

    const BROKEN_SELECTORS: SiteSelectors = SiteSelectors {
        search_field: r#"input[name="field-keywords"]"#,
        search_button: r#"input[value="Go"]"#,
        product_container: "div[[",
    };

    const BROKEN_FIELDS: FieldSelectors = FieldSelectors {
        image: "img",
        name: "h2",
        price: "span",
        url: "a",
    };

    impl SiteAdapter for BrokenListing {
        fn id(&self) -> SiteId {
            SiteId::AmazonCa
        }

        fn selectors(&self) -> &SiteSelectors {
            &BROKEN_SELECTORS
        }

        fn field_selectors(&self) -> &FieldSelectors {
            &BROKEN_FIELDS
        }
    }

    #[tokio::test]
    async fn test_full_run_delivers_matching_card() {
        let server = mount_shop().await;
        let sink = RecordingSink::default();
        let request = SearchRequest::new(SiteId::AmazonCa, "ryzen 9", "/results");
        let options = fast_options().with_start_url(format!("{}/", server.uri()));

        let report = run_search(&request, &SiteRegistry::builtin(), &live_page(), &sink, &options)
            .await
            .unwrap();

        assert_eq!(report.stats.accepted, 1);
        let batches = sink.batches.lock();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0.len(), 1);
        assert_eq!(batches[0].1, "/results");
    }

    #[tokio::test]
    async fn test_cancelled_extraction_is_not_delivered() {
        let server = mount_shop().await;
        let sink = RecordingSink::default();
        let request = SearchRequest::new(SiteId::AmazonCa, "ryzen 9", "/results");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut options = fast_options().with_start_url(format!("{}/", server.uri()));
        options.extraction = options.extraction.with_cancel(cancel);

        let err = run_search(&request, &SiteRegistry::builtin(), &live_page(), &sink, &options)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScoutError::Cancelled {
                matched: 1,
                cancelled: 1
            }
        ));
        assert!(sink.batches.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_listing_query_is_not_delivered() {
        let server = mount_shop().await;
        let sink = RecordingSink::default();
        let registry =
            SiteRegistry::from_adapters([Arc::new(BrokenListing) as Arc<dyn SiteAdapter>]);
        let request = SearchRequest::new(SiteId::AmazonCa, "ryzen 9", "/results");
        let options = fast_options().with_start_url(format!("{}/", server.uri()));

        let err = run_search(&request, &registry, &live_page(), &sink, &options)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScoutError::Listing {
                ref selector,
                source: PageError::InvalidSelector(_),
            } if selector == "div[["
        ));
        assert!(sink.batches.lock().is_empty());
    }
}
