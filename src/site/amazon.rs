//! amazon.ca search listing adapter

use crate::page::{Element, ElementHandle, PageResult};
use crate::site::{FieldSelectors, SiteAdapter, SiteId, SiteSelectors};
use futures::future::try_join_all;

const SELECTORS: SiteSelectors = SiteSelectors {
    search_field: r#"input[name="field-keywords"]"#,
    search_button: r#"input[value="Go"]"#,
    product_container: "div.s-card-container",
};

const FIELDS: FieldSelectors = FieldSelectors {
    image: "img.s-image",
    name: "h2 a span",
    price: "span.a-offscreen",
    url: "a.a-link-normal.s-no-hover.s-underline-text.s-underline-link-text.s-link-style.a-text-normal",
};

/// Availability lines inside a product card
const STOCK_SELECTOR: &str = ".a-size-base";

#[derive(Debug, Default)]
pub struct AmazonCa;

impl AmazonCa {
    pub fn new() -> Self {
        Self
    }
}

impl SiteAdapter for AmazonCa {
    fn id(&self) -> SiteId {
        SiteId::AmazonCa
    }

    fn selectors(&self) -> &SiteSelectors {
        &SELECTORS
    }

    fn field_selectors(&self) -> &FieldSelectors {
        &FIELDS
    }
}

/// Availability elements of a product card
///
/// Returns the `.a-size-base` elements whose text mentions "stock"
/// (case-insensitive), in query order.
pub async fn stock_elements(product: &dyn ElementHandle) -> PageResult<Vec<Element>> {
    let candidates = product.query_selector_all(STOCK_SELECTOR).await?;
    let texts = try_join_all(candidates.iter().map(|element| element.inner_text())).await?;

    Ok(candidates
        .into_iter()
        .zip(texts)
        .filter(|(_, text)| text.to_lowercase().contains("stock"))
        .map(|(element, _)| element)
        .collect())
}
