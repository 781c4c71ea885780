//! Shelf-Scout: concurrent product extraction from shopping-site search listings
//!
//! This crate drives a page session through a site's search form, extracts
//! product records from every listing element concurrently, filters them
//! against the search words and hands the batch to a downstream collector.

pub mod config;
pub mod extract;
pub mod output;
pub mod page;
pub mod scout;
pub mod search;
pub mod site;

use thiserror::Error;

/// Main error type for Shelf-Scout operations
///
/// Every variant except `Delivery` aborts the request before anything is
/// delivered. Element-level failures never reach this type; the orchestrator
/// contains them.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        source: page::PageError,
    },

    #[error("Search stage failed ({reason}): {detail}")]
    SearchStage {
        reason: search::SearchFailure,
        detail: String,
    },

    #[error("Listing query '{selector}' failed: {source}")]
    Listing {
        selector: String,
        source: page::PageError,
    },

    #[error("Extraction cancelled with {cancelled} of {matched} elements unfinished")]
    Cancelled { matched: usize, cancelled: usize },

    #[error("Delivery error: {0}")]
    Delivery(#[from] output::DeliveryError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Shelf-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractedProduct, FieldOutcome, SearchTerms};
pub use page::{ElementHandle, HttpPage, PageError, PageSession};
pub use scout::{run_search, RunOptions, RunReport, SearchRequest};
pub use search::{SearchFailure, SearchState};
pub use site::{SiteAdapter, SiteId, SiteRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_converts() {
        let err: ScoutError = output::DeliveryError::InvalidRoute("results".to_string()).into();
        assert!(matches!(err, ScoutError::Delivery(_)));
        assert_eq!(
            err.to_string(),
            "Delivery error: Invalid response route 'results': must start with '/'"
        );
    }

    #[test]
    fn test_cancelled_display() {
        let err = ScoutError::Cancelled {
            matched: 12,
            cancelled: 5,
        };
        assert_eq!(
            err.to_string(),
            "Extraction cancelled with 5 of 12 elements unfinished"
        );
    }
}
