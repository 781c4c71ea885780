//! Page session capability
//!
//! The extraction core never talks to a browser directly. It consumes the
//! minimal surface below: selector queries against the page, text and
//! attribute reads on elements, and the two interactions (type, click) the
//! search form needs.
//!
//! - `PageSession`: one live document plus navigation and load-state waits
//! - `ElementHandle`: an opaque reference to one node of that document
//! - `HttpPage`: the built-in session, fetching with `reqwest` and querying
//!   `scraper` snapshots

mod fetcher;
mod http_page;
mod parser;

pub use fetcher::build_http_client;
pub use http_page::{HttpElement, HttpPage, LoadState};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How often `wait_for_selector` re-queries the page
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors raised by a page session or one of its element handles
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Element is detached from the page")]
    Detached,

    #[error("Timed out after {timeout:?} waiting for selector '{selector}'")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("Timed out after {0:?} waiting for page load")]
    LoadTimeout(Duration),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Unsupported page action: {0}")]
    Unsupported(String),

    #[error("Page session closed")]
    Closed,
}

/// Result type alias for page session operations
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Shared, type-erased element handle
pub type Element = Arc<dyn ElementHandle>;

/// One node of the live document
///
/// Handles are only valid while the document they were taken from is
/// current. Once the page navigates away, every operation on an old handle
/// fails with [`PageError::Detached`].
#[async_trait]
pub trait ElementHandle: Send + Sync + fmt::Debug {
    /// First descendant matching `selector`
    async fn query_selector(&self, selector: &str) -> PageResult<Option<Element>>;

    /// All descendants matching `selector`, in document order
    async fn query_selector_all(&self, selector: &str) -> PageResult<Vec<Element>>;

    /// Rendered text with whitespace runs collapsed
    async fn inner_text(&self) -> PageResult<String>;

    async fn get_attribute(&self, name: &str) -> PageResult<Option<String>>;

    /// Types `text` into the element, appending to its current value
    async fn type_text(&self, text: &str) -> PageResult<()>;

    async fn click(&self) -> PageResult<()>;
}

/// A page the core can search and extract from
#[async_trait]
pub trait PageSession: Send + Sync {
    /// URL of the current document
    fn url(&self) -> String;

    /// Navigates to `url`, failing if the document is not loaded within `timeout`
    async fn goto(&self, url: &str, timeout: Duration) -> PageResult<()>;

    async fn query_selector(&self, selector: &str) -> PageResult<Option<Element>>;

    async fn query_selector_all(&self, selector: &str) -> PageResult<Vec<Element>>;

    /// Waits until `selector` matches, polling the page until `timeout`
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> PageResult<Element> {
        let poll = async {
            loop {
                if let Some(element) = self.query_selector(selector).await? {
                    return Ok::<Element, PageError>(element);
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(PageError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            }),
        }
    }

    /// Waits until no navigation is in flight
    async fn wait_for_load_state(&self, timeout: Duration) -> PageResult<()>;
}
