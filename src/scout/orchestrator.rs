//! Extraction orchestrator - concurrent fan-out over listing elements
//!
//! Every element matched by the product container selector gets its own
//! task. Tasks are gated by a semaphore, honor a shared cancellation token
//! and send accepted products over a channel. A failing or panicking task
//! drops only its own element.

use crate::extract::{ExtractedProduct, SearchTerms};
use crate::page::{Element, PageResult, PageSession};
use crate::site::SiteAdapter;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Default cap on concurrently running element tasks
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Tuning for one extraction pass
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Maximum number of element tasks extracting at once
    pub max_concurrency: usize,

    /// Cancels every task that has not finished yet
    pub cancel: Option<CancellationToken>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cancel: None,
        }
    }
}

impl ExtractionOptions {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Per-element tallies of one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Elements matched by the container selector
    pub matched: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Elements dropped because extraction errored or panicked
    pub failed: usize,
    pub cancelled: usize,
}

/// Accepted products plus the tallies that produced them
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// In completion order; treat as a set
    pub products: Vec<ExtractedProduct>,
    pub stats: ExtractionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Accepted,
    Rejected,
    Failed,
    Cancelled,
}

/// Extracts every accepted product from the elements matching `selector`
///
/// An absent page or an empty listing produce an empty result. A failing
/// container query is returned as an error; nothing was extracted.
pub async fn extract_listing(
    page: Option<&dyn PageSession>,
    selector: &str,
    adapter: Arc<dyn SiteAdapter>,
    terms: &SearchTerms,
    options: &ExtractionOptions,
) -> PageResult<Vec<ExtractedProduct>> {
    let extraction = extract_listing_with_stats(page, selector, adapter, terms, options).await?;
    Ok(extraction.products)
}

/// Same as [`extract_listing`], also reporting per-element tallies
pub async fn extract_listing_with_stats(
    page: Option<&dyn PageSession>,
    selector: &str,
    adapter: Arc<dyn SiteAdapter>,
    terms: &SearchTerms,
    options: &ExtractionOptions,
) -> PageResult<Extraction> {
    let Some(page) = page else {
        tracing::info!("No page to extract from");
        return Ok(Extraction::default());
    };

    let elements = page.query_selector_all(selector).await.map_err(|e| {
        tracing::error!("Listing query '{}' failed: {}", selector, e);
        e
    })?;

    if elements.is_empty() {
        tracing::info!("No elements matched '{}'", selector);
        return Ok(Extraction::default());
    }

    Ok(extract_elements(elements, adapter, terms, options).await)
}

/// Fans out over already-matched elements
pub async fn extract_elements(
    elements: Vec<Element>,
    adapter: Arc<dyn SiteAdapter>,
    terms: &SearchTerms,
    options: &ExtractionOptions,
) -> Extraction {
    let mut stats = ExtractionStats {
        matched: elements.len(),
        ..ExtractionStats::default()
    };
    let permits = options.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
    tracing::info!(
        "Extracting {} elements (max {} concurrent)",
        stats.matched,
        permits
    );

    let semaphore = Arc::new(Semaphore::new(permits));
    let cancel = options.cancel.clone().unwrap_or_default();
    let terms = Arc::new(terms.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut tasks = JoinSet::new();
    for (index, element) in elements.into_iter().enumerate() {
        tasks.spawn(extract_one(
            index,
            element,
            Arc::clone(&adapter),
            Arc::clone(&terms),
            Arc::clone(&semaphore),
            cancel.clone(),
            tx.clone(),
        ));
    }
    drop(tx);

    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                tracing::warn!("Element task panicked: {}", e);
                TaskOutcome::Failed
            }
            Err(_) => TaskOutcome::Cancelled,
        };

        match outcome {
            TaskOutcome::Accepted => stats.accepted += 1,
            TaskOutcome::Rejected => stats.rejected += 1,
            TaskOutcome::Failed => stats.failed += 1,
            TaskOutcome::Cancelled => stats.cancelled += 1,
        }
    }

    let mut products = Vec::with_capacity(stats.accepted);
    while let Some(product) = rx.recv().await {
        products.push(product);
    }

    tracing::info!(
        "Extraction finished: {} matched, {} accepted, {} rejected, {} failed, {} cancelled",
        stats.matched,
        stats.accepted,
        stats.rejected,
        stats.failed,
        stats.cancelled
    );

    Extraction { products, stats }
}

async fn extract_one(
    index: usize,
    element: Element,
    adapter: Arc<dyn SiteAdapter>,
    terms: Arc<SearchTerms>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    results: mpsc::UnboundedSender<ExtractedProduct>,
) -> TaskOutcome {
    if cancel.is_cancelled() {
        return TaskOutcome::Cancelled;
    }

    let _permit = tokio::select! {
        _ = cancel.cancelled() => return TaskOutcome::Cancelled,
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return TaskOutcome::Cancelled,
        },
    };

    let extracted = tokio::select! {
        _ = cancel.cancelled() => return TaskOutcome::Cancelled,
        extracted = adapter.extract(element.as_ref()) => extracted,
    };

    let product = match extracted {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!("Dropping element {}: {}", index, e);
            return TaskOutcome::Failed;
        }
    };

    if !terms.accepts(&product) {
        tracing::debug!("Rejected element {}: {:?}", index, product.name);
        return TaskOutcome::Rejected;
    }

    tracing::debug!("Accepted element {}: {:?}", index, product.name);
    match results.send(product) {
        Ok(()) => TaskOutcome::Accepted,
        Err(_) => TaskOutcome::Cancelled,
    }
}
