//! HTTP fetcher for page navigation
//!
//! This module handles the requests behind `HttpPage` navigation:
//! - Building HTTP clients with a proper user agent string
//! - GET requests for documents, following redirects
//! - Error classification into `PageError::Navigation`

use crate::config::UserAgentConfig;
use crate::page::{PageError, PageResult};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// A fetched HTML document
#[derive(Debug)]
pub(crate) struct FetchedDocument {
    /// Final URL after redirects
    pub final_url: Url,

    pub html: String,
}

/// Builds an HTTP client with proper configuration
///
/// The same client serves page navigation and collector delivery. Overall
/// request time is bounded by the caller (navigation timeout), not here.
///
/// # Example
///
/// ```no_run
/// use shelf_scout::config::UserAgentConfig;
/// use shelf_scout::page::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "ShelfScout".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches an HTML document
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML (or no) Content-Type | document |
/// | 2xx with another Content-Type | Navigation error |
/// | Non-2xx status | Navigation error with the status |
/// | Timeout / connection refused | Navigation error |
pub(crate) async fn fetch_document(client: &Client, url: &Url) -> PageResult<FetchedDocument> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| navigation_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageError::Navigation {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !content_type.contains("text/html") {
        return Err(PageError::Navigation {
            url: url.to_string(),
            message: format!("Expected HTML, got {}", content_type),
        });
    }

    let final_url = response.url().clone();
    let html = response
        .text()
        .await
        .map_err(|e| navigation_error(url, &e))?;

    tracing::debug!("Fetched {} ({} bytes)", final_url, html.len());

    Ok(FetchedDocument { final_url, html })
}

fn navigation_error(url: &Url, error: &reqwest::Error) -> PageError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };

    PageError::Navigation {
        url: url.to_string(),
        message,
    }
}
