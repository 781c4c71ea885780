//! Acceptance filtering against the search words

use crate::extract::ExtractedProduct;

/// Lowercased search words a product name must contain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    words: Vec<String>,
}

impl SearchTerms {
    /// Splits `query` on whitespace, dropping empty tokens
    pub fn from_query(query: &str) -> Self {
        Self::from_words(query.split_whitespace())
    }

    pub fn from_words<S: AsRef<str>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True when `name` contains every word, ignoring case
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.words.iter().all(|word| name.contains(word.as_str()))
    }

    /// Whether `product` belongs in the batch
    ///
    /// Requires a price, a url and a name containing every word. A product
    /// without a name is always rejected.
    pub fn accepts(&self, product: &ExtractedProduct) -> bool {
        if product.price.is_none() || product.url.is_none() {
            return false;
        }

        match &product.name {
            Some(name) => self.matches_name(name),
            None => false,
        }
    }
}
