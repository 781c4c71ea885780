//! Page session over plain HTTP
//!
//! `HttpPage` behaves like a browser tab without a script engine. Each
//! navigation fetches a document and bumps its generation; element handles
//! remember the generation they were taken from and detach once the page
//! moves on. Typing records form values, clicking a submit control submits
//! the enclosing GET form, clicking a link follows it.

use crate::page::fetcher::{fetch_document, FetchedDocument};
use crate::page::parser::{
    parse_selector, resolve_link, select_document, select_within, FormContext, NodeSnapshot,
};
use crate::page::{Element, ElementHandle, PageError, PageResult, PageSession};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Whether a navigation is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
}

#[derive(Debug, Clone)]
struct Document {
    url: Url,
    html: Arc<str>,
    generation: u64,
}

/// Holds the page in `Loading` until dropped, including when the
/// navigation future is abandoned mid-fetch
struct LoadingGuard<'a>(&'a watch::Sender<LoadState>);

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<LoadState>) -> Self {
        state.send_replace(LoadState::Loading);
        Self(state)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(LoadState::Loaded);
    }
}

struct PageInner {
    /// None for offline snapshots, which cannot navigate
    client: Option<Client>,
    navigation_timeout: Duration,
    document: RwLock<Document>,
    /// Values typed into named form controls of the current document
    typed: Mutex<HashMap<String, String>>,
    load_state: watch::Sender<LoadState>,
}

impl PageInner {
    fn current(&self) -> Document {
        self.document.read().clone()
    }

    fn generation(&self) -> u64 {
        self.document.read().generation
    }

    async fn navigate(&self, target: Url, timeout: Duration) -> PageResult<()> {
        let client = self.client.as_ref().ok_or_else(|| {
            PageError::Unsupported(format!("offline snapshot cannot navigate to {}", target))
        })?;

        tracing::debug!("Navigating to {}", target);
        let _loading = LoadingGuard::start(&self.load_state);

        match tokio::time::timeout(timeout, fetch_document(client, &target)).await {
            Ok(Ok(fetched)) => {
                self.install(fetched);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PageError::Navigation {
                url: target.to_string(),
                message: format!("timed out after {:?}", timeout),
            }),
        }
    }

    fn install(&self, fetched: FetchedDocument) {
        let mut document = self.document.write();
        document.url = fetched.final_url;
        document.html = Arc::from(fetched.html);
        document.generation += 1;
        self.typed.lock().clear();
    }
}

/// A page session backed by `reqwest` and `scraper`
///
/// # Example
///
/// ```no_run
/// use shelf_scout::page::{HttpPage, PageSession};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let page = HttpPage::new(reqwest::Client::new(), Duration::from_secs(60));
/// page.goto("https://amazon.ca", Duration::from_secs(120)).await?;
/// let cards = page.query_selector_all("div.s-card-container").await?;
/// println!("{} cards", cards.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpPage {
    inner: Arc<PageInner>,
}

impl HttpPage {
    /// Creates a blank page that navigates with `client`
    ///
    /// `navigation_timeout` bounds navigations triggered by clicks.
    pub fn new(client: Client, navigation_timeout: Duration) -> Self {
        Self::with_parts(
            Some(client),
            Url::parse("about:blank").expect("static URL"),
            "",
            navigation_timeout,
        )
    }

    /// Creates an offline snapshot of `html` served at `url`
    ///
    /// Queries, typing and reads work as usual; anything that would
    /// navigate fails with [`PageError::Unsupported`].
    pub fn from_html(url: &str, html: &str) -> PageResult<Self> {
        let url = Url::parse(url).map_err(|e| PageError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::with_parts(None, url, html, Duration::ZERO))
    }

    fn with_parts(client: Option<Client>, url: Url, html: &str, timeout: Duration) -> Self {
        let (load_state, _) = watch::channel(LoadState::Loaded);
        Self {
            inner: Arc::new(PageInner {
                client,
                navigation_timeout: timeout,
                document: RwLock::new(Document {
                    url,
                    html: Arc::from(html),
                    generation: 0,
                }),
                typed: Mutex::new(HashMap::new()),
                load_state,
            }),
        }
    }

    /// Number of navigations completed so far
    pub fn generation(&self) -> u64 {
        self.inner.generation()
    }

    pub fn load_state(&self) -> LoadState {
        *self.inner.load_state.borrow()
    }

    fn select(&self, selector: &str, limit: Option<usize>) -> PageResult<Vec<Element>> {
        let selector = parse_selector(selector)?;
        let document = self.inner.current();
        let nodes = select_document(&document.html, &selector, limit);
        Ok(nodes
            .into_iter()
            .map(|node| HttpElement::new(&self.inner, document.generation, node))
            .collect())
    }
}

impl fmt::Debug for HttpPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPage")
            .field("url", &self.url())
            .field("generation", &self.generation())
            .field("offline", &self.inner.client.is_none())
            .finish()
    }
}

#[async_trait]
impl PageSession for HttpPage {
    fn url(&self) -> String {
        self.inner.document.read().url.to_string()
    }

    async fn goto(&self, url: &str, timeout: Duration) -> PageResult<()> {
        let target = Url::parse(url).map_err(|e| PageError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        self.inner.navigate(target, timeout).await
    }

    async fn query_selector(&self, selector: &str) -> PageResult<Option<Element>> {
        Ok(self.select(selector, Some(1))?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> PageResult<Vec<Element>> {
        self.select(selector, None)
    }

    async fn wait_for_load_state(&self, timeout: Duration) -> PageResult<()> {
        let mut receiver = self.inner.load_state.subscribe();
        let waited = tokio::time::timeout(
            timeout,
            receiver.wait_for(|state| *state == LoadState::Loaded),
        )
        .await
        .map(|loaded| loaded.is_ok());

        match waited {
            Ok(true) => Ok(()),
            Ok(false) => Err(PageError::Closed),
            Err(_) => Err(PageError::LoadTimeout(timeout)),
        }
    }
}

/// Element handle into an `HttpPage` document
pub struct HttpElement {
    page: Arc<PageInner>,
    generation: u64,
    node: NodeSnapshot,
}

impl HttpElement {
    fn new(page: &Arc<PageInner>, generation: u64, node: NodeSnapshot) -> Element {
        Arc::new(Self {
            page: Arc::clone(page),
            generation,
            node,
        })
    }

    fn ensure_attached(&self) -> PageResult<()> {
        if self.page.generation() == self.generation {
            Ok(())
        } else {
            Err(PageError::Detached)
        }
    }

    fn select(&self, selector: &str, limit: Option<usize>) -> PageResult<Vec<Element>> {
        self.ensure_attached()?;
        let selector = parse_selector(selector)?;
        let nodes = select_within(&self.node.html, &selector, limit, self.node.form.as_ref());
        Ok(nodes
            .into_iter()
            .map(|node| HttpElement::new(&self.page, self.generation, node))
            .collect())
    }

    fn is_submitter(&self) -> bool {
        let kind = self.node.attr("type").map(str::to_ascii_lowercase);
        match self.node.tag.as_str() {
            "button" => matches!(kind.as_deref(), None | Some("submit")),
            "input" => matches!(kind.as_deref(), Some("submit" | "image")),
            _ => false,
        }
    }

    /// Where clicking this element navigates to
    fn click_target(&self) -> PageResult<Url> {
        let base = self.page.current().url;

        if self.node.tag == "a" {
            if let Some(href) = self.node.attr("href") {
                return resolve_link(href, &base).ok_or_else(|| {
                    PageError::Unsupported(format!("link '{}' cannot be followed", href))
                });
            }
        }

        match &self.node.form {
            Some(form) if self.is_submitter() => self.form_submission(form, &base),
            _ => Err(PageError::Unsupported(format!(
                "clicking <{}> does not navigate",
                self.node.tag
            ))),
        }
    }

    fn form_submission(&self, form: &FormContext, base: &Url) -> PageResult<Url> {
        if form.method != "get" {
            return Err(PageError::Unsupported(format!(
                "{} form submission",
                form.method.to_ascii_uppercase()
            )));
        }

        let mut target = base.join(&form.action).map_err(|e| PageError::Navigation {
            url: form.action.clone(),
            message: e.to_string(),
        })?;

        let typed = self.page.typed.lock();
        {
            let mut query = target.query_pairs_mut();
            query.clear();
            for (name, initial) in &form.fields {
                let value = typed.get(name).map_or(initial.as_str(), String::as_str);
                query.append_pair(name, value);
            }
            if let Some(name) = self.node.attr("name") {
                query.append_pair(name, self.node.attr("value").unwrap_or_default());
            }
        }

        Ok(target)
    }
}

impl fmt::Debug for HttpElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpElement")
            .field("tag", &self.node.tag)
            .field("generation", &self.generation)
            .finish()
    }
}

#[async_trait]
impl ElementHandle for HttpElement {
    async fn query_selector(&self, selector: &str) -> PageResult<Option<Element>> {
        Ok(self.select(selector, Some(1))?.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> PageResult<Vec<Element>> {
        self.select(selector, None)
    }

    async fn inner_text(&self) -> PageResult<String> {
        self.ensure_attached()?;
        Ok(self.node.text.clone())
    }

    async fn get_attribute(&self, name: &str) -> PageResult<Option<String>> {
        self.ensure_attached()?;
        Ok(self.node.attr(name).map(str::to_string))
    }

    async fn type_text(&self, text: &str) -> PageResult<()> {
        self.ensure_attached()?;

        if !matches!(self.node.tag.as_str(), "input" | "textarea") {
            return Err(PageError::Unsupported(format!(
                "cannot type into <{}>",
                self.node.tag
            )));
        }
        let Some(name) = self.node.attr("name") else {
            return Err(PageError::Unsupported(
                "cannot type into an unnamed control".to_string(),
            ));
        };

        let mut typed = self.page.typed.lock();
        typed
            .entry(name.to_string())
            .or_insert_with(|| self.node.attr("value").unwrap_or_default().to_string())
            .push_str(text);
        Ok(())
    }

    async fn click(&self) -> PageResult<()> {
        self.ensure_attached()?;
        let target = self.click_target()?;
        self.page
            .navigate(target, self.page.navigation_timeout)
            .await
    }
}
