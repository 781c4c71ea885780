//! Output module for delivering search results
//!
//! This module handles:
//! - Posting result batches to the downstream collector
//! - Writing the optional local results file
//! - Printing the end-of-run summary

mod http_collector;
mod json_file;
mod report;
mod traits;

pub use http_collector::HttpCollector;
pub use json_file::{save_results, JsonFileSink};
pub use report::print_report;
pub use traits::{
    DeliveryError, DeliveryOutcome, OutputError, OutputResult, ResultBatch, ResultSink,
};
