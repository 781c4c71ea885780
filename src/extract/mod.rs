//! Product extraction
//!
//! This module turns one listing element into an [`ExtractedProduct`]:
//! - concurrent resolution of the image, name, price and url fields
//! - per-field normalization with typed outcomes
//! - acceptance filtering against the search words

mod fields;
mod product;
mod terms;

pub use fields::{canonical_product_path, parse_price, FieldOutcome};
pub use product::{extract_fields, extract_product, ExtractedProduct, ProductFields};
pub use terms::SearchTerms;
