//! Site adapters
//!
//! A site adapter binds one supported shop to the selectors the search
//! controller needs and to the strategy that turns a listing element into
//! an [`ExtractedProduct`]. The registry is built once at startup and passed
//! by reference; nothing mutates it afterwards.

mod amazon;

pub use amazon::{stock_elements, AmazonCa};

use crate::extract::{extract_product, ExtractedProduct};
use crate::page::{ElementHandle, PageResult};
use crate::ScoutError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Typed identifier of a supported site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteId {
    AmazonCa,
}

impl SiteId {
    /// Identifier sent to the collector as the batch source
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmazonCa => "amazon.ca",
        }
    }

    /// Page the search starts from
    pub fn home_url(&self) -> &'static str {
        match self {
            Self::AmazonCa => "https://amazon.ca",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::AmazonCa]
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SiteId {
    type Err = ScoutError;

    /// Accepts the bare identifier (`amazon.ca`) or any URL on the site
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let host = if trimmed.contains("://") {
            Url::parse(trimmed)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
                .ok_or_else(|| ScoutError::UnknownSite(s.to_string()))?
        } else {
            trimmed.trim_end_matches('/').to_ascii_lowercase()
        };
        let host = host.strip_prefix("www.").unwrap_or(&host);

        Self::all()
            .into_iter()
            .find(|site| site.as_str() == host)
            .ok_or_else(|| ScoutError::UnknownSite(s.to_string()))
    }
}

/// Selectors the search controller and orchestrator use on a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteSelectors {
    pub search_field: &'static str,
    pub search_button: &'static str,
    pub product_container: &'static str,
}

/// Sub-element selectors inside one product container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelectors {
    pub image: &'static str,
    pub name: &'static str,
    pub price: &'static str,
    pub url: &'static str,
}

/// Everything the core needs to know about one site
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn id(&self) -> SiteId;

    fn home_url(&self) -> &str {
        self.id().home_url()
    }

    fn selectors(&self) -> &SiteSelectors;

    fn field_selectors(&self) -> &FieldSelectors;

    /// Extracts one product from a listing element
    ///
    /// Missing or malformed fields become absent; only page errors (such as
    /// a detached element) fail the extraction.
    async fn extract(&self, element: &dyn ElementHandle) -> PageResult<ExtractedProduct> {
        extract_product(element, self.field_selectors()).await
    }
}

/// Immutable mapping from site identifier to adapter
#[derive(Clone)]
pub struct SiteRegistry {
    adapters: HashMap<SiteId, Arc<dyn SiteAdapter>>,
}

impl SiteRegistry {
    /// Registry with every built-in adapter
    pub fn builtin() -> Self {
        Self::from_adapters([Arc::new(AmazonCa::new()) as Arc<dyn SiteAdapter>])
    }

    /// Builds a registry; a later adapter replaces an earlier one with the same id
    pub fn from_adapters(adapters: impl IntoIterator<Item = Arc<dyn SiteAdapter>>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.id(), adapter))
                .collect(),
        }
    }

    /// Looks up the adapter for `site`
    ///
    /// # Returns
    ///
    /// * `Ok(adapter)` - The registered adapter
    /// * `Err(ScoutError::UnknownSite)` - No adapter is registered for `site`
    pub fn resolve(&self, site: SiteId) -> Result<Arc<dyn SiteAdapter>, ScoutError> {
        self.adapters
            .get(&site)
            .cloned()
            .ok_or_else(|| ScoutError::UnknownSite(site.to_string()))
    }

    /// Parses `site` and looks up its adapter
    pub fn resolve_str(&self, site: &str) -> Result<Arc<dyn SiteAdapter>, ScoutError> {
        self.resolve(site.parse()?)
    }

    /// Registered sites, sorted by identifier
    pub fn sites(&self) -> Vec<SiteId> {
        let mut sites: Vec<SiteId> = self.adapters.keys().copied().collect();
        sites.sort_by_key(|site| site.as_str());
        sites
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteRegistry")
            .field("sites", &self.sites())
            .finish()
    }
}
