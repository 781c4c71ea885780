//! Search stage
//!
//! Drives a page through the site's search form and reports whether the
//! results listing is ready for extraction.
//!
//! # Components
//!
//! - `SearchState`: the stages of one search (fill, submit, load)
//! - `SearchFailure`: why a search stopped early
//! - `SearchController`: runs the stages against a page session

mod controller;
mod state;

pub use controller::{SearchController, SearchTimeouts};
pub use state::{SearchFailure, SearchState};
