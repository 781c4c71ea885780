//! Result sink traits and types
//!
//! This module defines the batch handed to downstream consumers and the
//! trait every delivery target implements.

use crate::extract::ExtractedProduct;
use crate::site::SiteId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while writing local output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Errors that can occur while handing a batch to the collector
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Collector at {url} unreachable: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Collector at {url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response route '{0}': must start with '/'")]
    InvalidRoute(String),
}

/// Accepted products of one request plus its metadata
///
/// Serializes to the collector payload:
/// `{"data": [...], "search_text": "...", "source": "amazon.ca"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBatch {
    /// In completion order; consumers must treat this as a set
    #[serde(rename = "data")]
    pub products: Vec<ExtractedProduct>,

    /// The query text as the user entered it
    pub search_text: String,

    /// Site identifier the products came from
    pub source: String,
}

impl ResultBatch {
    pub fn new(products: Vec<ExtractedProduct>, search_text: impl Into<String>, source: SiteId) -> Self {
        Self {
            products,
            search_text: search_text.into(),
            source: source.as_str().to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// What the collector answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub status_code: u16,
}

/// Trait for batch delivery targets
///
/// A sink is called once per request and never retries. Implementations
/// must be thread-safe.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Hands `batch` to the consumer listening on `route`
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryOutcome)` - The consumer accepted the batch
    /// * `Err(DeliveryError)` - The consumer was unreachable or refused it
    async fn deliver(&self, batch: &ResultBatch, route: &str) -> Result<DeliveryOutcome, DeliveryError>;
}
