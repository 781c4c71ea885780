//! Product extraction from one listing element

use crate::extract::fields::{canonical_product_path, parse_price, FieldOutcome};
use crate::page::{ElementHandle, PageResult};
use crate::site::FieldSelectors;
use serde::{Deserialize, Serialize};

/// One product read from a listing
///
/// Serializes to the collector's record shape:
/// `{"img", "name", "price", "url"}`, with absent fields as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProduct {
    #[serde(rename = "img")]
    pub image: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
}

/// Field outcomes of one element, before collapsing into a product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub image: FieldOutcome<String>,
    pub name: FieldOutcome<String>,
    pub price: FieldOutcome<f64>,
    pub url: FieldOutcome<String>,
}

impl ProductFields {
    pub fn into_product(self) -> ExtractedProduct {
        ExtractedProduct {
            image: self.image.into_option(),
            name: self.name.into_option(),
            price: self.price.into_option(),
            url: self.url.into_option(),
        }
    }
}

/// Resolves the four fields of `element` concurrently
///
/// The image, name, price and url sub-queries share nothing and run
/// together; this returns once all four finish, even when one of them fails
/// early. A page error from any of them fails the whole element.
pub async fn extract_fields(
    element: &dyn ElementHandle,
    selectors: &FieldSelectors,
) -> PageResult<ProductFields> {
    let (image, name, price, url) = tokio::join!(
        read_attribute(element, selectors.image, "src"),
        read_text(element, selectors.name),
        read_price(element, selectors.price),
        read_link(element, selectors.url),
    );

    Ok(ProductFields {
        image: image?,
        name: name?,
        price: price?,
        url: url?,
    })
}

/// Extracts a product, collapsing malformed fields to absent
pub async fn extract_product(
    element: &dyn ElementHandle,
    selectors: &FieldSelectors,
) -> PageResult<ExtractedProduct> {
    let fields = extract_fields(element, selectors).await?;

    if let FieldOutcome::Malformed { raw } = &fields.price {
        tracing::debug!("Ignoring malformed price {:?}", raw);
    }

    Ok(fields.into_product())
}

async fn read_attribute(
    element: &dyn ElementHandle,
    selector: &str,
    attribute: &str,
) -> PageResult<FieldOutcome<String>> {
    match element.query_selector(selector).await? {
        Some(found) => Ok(found.get_attribute(attribute).await?.into()),
        None => Ok(FieldOutcome::Absent),
    }
}

async fn read_text(element: &dyn ElementHandle, selector: &str) -> PageResult<FieldOutcome<String>> {
    match element.query_selector(selector).await? {
        Some(found) => Ok(FieldOutcome::Present(found.inner_text().await?)),
        None => Ok(FieldOutcome::Absent),
    }
}

async fn read_price(element: &dyn ElementHandle, selector: &str) -> PageResult<FieldOutcome<f64>> {
    match element.query_selector(selector).await? {
        Some(found) => Ok(parse_price(&found.inner_text().await?)),
        None => Ok(FieldOutcome::Absent),
    }
}

async fn read_link(element: &dyn ElementHandle, selector: &str) -> PageResult<FieldOutcome<String>> {
    let href = read_attribute(element, selector, "href").await?;
    Ok(href.map(|href| canonical_product_path(&href)))
}
