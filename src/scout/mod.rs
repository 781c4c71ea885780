//! Request pipeline
//!
//! This module contains the two halves of a request:
//! - `coordinator`: navigation, search and delivery for one request
//! - `orchestrator`: the concurrent extraction pass over the listing

mod coordinator;
mod orchestrator;

pub use coordinator::{run_search, RunOptions, RunReport, SearchRequest};
pub use orchestrator::{
    extract_elements, extract_listing, extract_listing_with_stats, Extraction, ExtractionOptions,
    ExtractionStats, DEFAULT_MAX_CONCURRENCY,
};
