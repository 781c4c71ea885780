//! Collector delivery over HTTP

use crate::output::{DeliveryError, DeliveryOutcome, ResultBatch, ResultSink};
use async_trait::async_trait;
use reqwest::Client;

/// Posts batches as JSON to `base_url + route`
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: Client,
    base_url: String,
}

impl HttpCollector {
    /// Creates a collector client; a trailing `/` on `base_url` is dropped
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL a batch for `route` is posted to
    pub fn endpoint(&self, route: &str) -> Result<String, DeliveryError> {
        if !route.starts_with('/') || route.chars().any(char::is_whitespace) {
            return Err(DeliveryError::InvalidRoute(route.to_string()));
        }
        Ok(format!("{}{}", self.base_url, route))
    }
}

#[async_trait]
impl ResultSink for HttpCollector {
    async fn deliver(&self, batch: &ResultBatch, route: &str) -> Result<DeliveryOutcome, DeliveryError> {
        let url = self.endpoint(route)?;
        tracing::info!("Posting {} products to {}", batch.len(), url);

        let response = self
            .client
            .post(&url)
            .json(batch)
            .send()
            .await
            .map_err(|source| DeliveryError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url,
                status: status.as_u16(),
            });
        }

        Ok(DeliveryOutcome {
            status_code: status.as_u16(),
        })
    }
}
