//! Per-field normalization
//!
//! Every field of a product resolves to a [`FieldOutcome`]. A missing
//! sub-element and an unparseable value both end up absent in the product,
//! but stay distinguishable here for logging and tests.

use url::Url;

/// Number of path segments kept in a canonical product link
const PRODUCT_PATH_SEGMENTS: usize = 4;

/// Result of resolving one field of a product element
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    /// The sub-element exists and its value normalized cleanly
    Present(T),

    /// The sub-element (or its attribute) does not exist
    Absent,

    /// The sub-element exists but its value could not be normalized
    Malformed { raw: String },
}

impl<T> FieldOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Malformed { .. } => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldOutcome<U> {
        match self {
            Self::Present(value) => FieldOutcome::Present(f(value)),
            Self::Absent => FieldOutcome::Absent,
            Self::Malformed { raw } => FieldOutcome::Malformed { raw },
        }
    }
}

impl<T> From<Option<T>> for FieldOutcome<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Parses a displayed price such as `"$1,234.56"`
///
/// Strips the currency symbol and thousands separators, then trims. Text
/// that is not a finite, non-negative number is `Malformed`.
///
/// # Example
///
/// ```
/// use shelf_scout::extract::{parse_price, FieldOutcome};
///
/// assert_eq!(parse_price("$1,234.56"), FieldOutcome::Present(1234.56));
/// assert!(parse_price("free").is_malformed());
/// ```
pub fn parse_price(raw: &str) -> FieldOutcome<f64> {
    let cleaned = raw.replace(['$', ','], "");
    match cleaned.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => FieldOutcome::Present(price),
        _ => FieldOutcome::Malformed {
            raw: raw.to_string(),
        },
    }
}

/// Truncates a product link to its canonical path
///
/// Drops the query string and fragment, then keeps the first four path
/// segments. An absolute link keeps its origin (scheme, host and any
/// non-default port).
///
/// # Example
///
/// ```
/// use shelf_scout::extract::canonical_product_path;
///
/// assert_eq!(canonical_product_path("/a/b/c/d/e?x=1"), "/a/b/c/d");
/// ```
pub fn canonical_product_path(href: &str) -> String {
    let href = href.trim();

    if let Ok(url) = Url::parse(href) {
        if url.host_str().is_some() {
            let segments: Vec<&str> = url
                .path_segments()
                .map(|segments| {
                    segments
                        .filter(|segment| !segment.is_empty())
                        .take(PRODUCT_PATH_SEGMENTS)
                        .collect()
                })
                .unwrap_or_default();

            let origin = url.origin().ascii_serialization();
            if segments.is_empty() {
                return origin;
            }
            return format!("{}/{}", origin, segments.join("/"));
        }
    }

    let end = href.find(|c: char| c == '?' || c == '#').unwrap_or(href.len());
    let path = &href[..end];

    let leading = if path.starts_with('/') { "/" } else { "" };
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(PRODUCT_PATH_SEGMENTS)
        .collect();

    format!("{}{}", leading, segments.join("/"))
}
