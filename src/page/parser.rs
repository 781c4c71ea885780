//! HTML snapshots for page queries
//!
//! `scraper` documents cannot cross an `.await`, so every query parses the
//! HTML, copies out what handles need (tag, outer HTML, text, attributes,
//! enclosing form) and drops the document before returning.

use crate::page::{PageError, PageResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Owned copy of one matched element
#[derive(Debug, Clone)]
pub(crate) struct NodeSnapshot {
    /// Lowercase tag name
    pub tag: String,

    /// Outer HTML, re-parsed for nested queries
    pub html: String,

    /// Text content with whitespace runs collapsed
    pub text: String,

    pub attributes: Vec<(String, String)>,

    /// The form this element submits, if any
    pub form: Option<FormContext>,
}

impl NodeSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Enclosing `<form>` of an element
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FormContext {
    pub action: String,

    /// Lowercase HTTP method, `get` when unspecified
    pub method: String,

    /// Named, non-button controls with their initial values, in document order
    pub fields: Vec<(String, String)>,
}

pub(crate) fn parse_selector(selector: &str) -> PageResult<Selector> {
    Selector::parse(selector).map_err(|_| PageError::InvalidSelector(selector.to_string()))
}

/// Snapshots elements of a full document matching `selector`, in document order
pub(crate) fn select_document(
    html: &str,
    selector: &Selector,
    limit: Option<usize>,
) -> Vec<NodeSnapshot> {
    let document = Html::parse_document(html);
    collect(document.select(selector), limit, None)
}

/// Snapshots descendants of the element serialized in `outer_html`
///
/// The scope element itself never matches. Matches without a form of their
/// own inherit `inherited`, the scope's form.
pub(crate) fn select_within(
    outer_html: &str,
    selector: &Selector,
    limit: Option<usize>,
    inherited: Option<&FormContext>,
) -> Vec<NodeSnapshot> {
    let fragment = Html::parse_fragment(outer_html);
    let Some(scope) = fragment.root_element().children().find_map(ElementRef::wrap) else {
        return Vec::new();
    };
    collect(scope.select(selector), limit, inherited)
}

fn collect<'a>(
    matches: impl Iterator<Item = ElementRef<'a>>,
    limit: Option<usize>,
    inherited: Option<&FormContext>,
) -> Vec<NodeSnapshot> {
    matches
        .take(limit.unwrap_or(usize::MAX))
        .map(|element| snapshot(element, inherited))
        .collect()
}

fn snapshot(element: ElementRef<'_>, inherited: Option<&FormContext>) -> NodeSnapshot {
    let value = element.value();
    NodeSnapshot {
        tag: value.name().to_ascii_lowercase(),
        html: element.html(),
        text: collapse_whitespace(element.text()),
        attributes: value
            .attrs()
            .map(|(key, val)| (key.to_string(), val.to_string()))
            .collect(),
        form: form_context(element).or_else(|| inherited.cloned()),
    }
}

fn form_context(element: ElementRef<'_>) -> Option<FormContext> {
    let form = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "form")?;

    let mut fields = Vec::new();
    if let Ok(controls) = Selector::parse("input[name], textarea[name], select[name]") {
        for control in form.select(&controls) {
            let value = control.value();
            let kind = value.attr("type").map(str::to_ascii_lowercase);
            if matches!(
                kind.as_deref(),
                Some("submit" | "button" | "image" | "reset")
            ) {
                continue;
            }
            if let Some(name) = value.attr("name") {
                fields.push((
                    name.to_string(),
                    value.attr("value").unwrap_or_default().to_string(),
                ));
            }
        }
    }

    Some(FormContext {
        action: form.value().attr("action").unwrap_or_default().to_string(),
        method: form
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_ascii_lowercase(),
        fields,
    })
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href against the current document URL
///
/// Returns None for links a navigation cannot follow:
/// - javascript:, mailto:, tel: and data: schemes
/// - fragment-only links
/// - anything that does not resolve to HTTP(S)
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
