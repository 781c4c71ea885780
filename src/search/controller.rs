//! Search controller - fill, submit, wait for the listing

use crate::config::BrowserConfig;
use crate::page::{PageError, PageSession};
use crate::search::{SearchFailure, SearchState};
use crate::site::SiteSelectors;
use crate::ScoutError;
use std::time::Duration;

/// Bounds on the waits a search performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTimeouts {
    /// Wait for the search input and the submit control to appear
    pub selector: Duration,

    /// Wait for the results page to finish loading
    pub load: Duration,
}

impl SearchTimeouts {
    pub fn from_config(browser: &BrowserConfig) -> Self {
        Self {
            selector: browser.selector_timeout(),
            load: browser.load_timeout(),
        }
    }
}

/// Runs one search on a page that already shows the site's home page
pub struct SearchController<'a> {
    page: &'a dyn PageSession,
    selectors: &'a SiteSelectors,
    timeouts: SearchTimeouts,
    state: SearchState,
    history: Vec<SearchState>,
}

impl<'a> SearchController<'a> {
    pub fn new(
        page: &'a dyn PageSession,
        selectors: &'a SiteSelectors,
        timeouts: SearchTimeouts,
    ) -> Self {
        Self {
            page,
            selectors,
            timeouts,
            state: SearchState::Idle,
            history: vec![SearchState::Idle],
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> &[SearchState] {
        &self.history
    }

    /// Types `query` into the search field, submits it and waits for the listing
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The controller is `Ready`
    /// * `Err(ScoutError::SearchStage)` - A stage failed; the controller is `Failed`
    pub async fn run(&mut self, query: &str) -> Result<(), ScoutError> {
        if self.state != SearchState::Idle {
            return Err(ScoutError::SearchStage {
                reason: self.state.failure().unwrap_or(SearchFailure::SubmitError),
                detail: format!("search already ran (state {})", self.state),
            });
        }

        self.transition(SearchState::FillingQuery);
        let field = self
            .page
            .wait_for_selector(self.selectors.search_field, self.timeouts.selector)
            .await
            .map_err(|e| self.fail(SearchFailure::SearchFieldNotFound, e))?;
        field
            .type_text(query)
            .await
            .map_err(|e| self.fail(SearchFailure::FillError, e))?;

        self.transition(SearchState::SubmittingQuery);
        let button = self
            .page
            .wait_for_selector(self.selectors.search_button, self.timeouts.selector)
            .await
            .map_err(|e| self.fail(SearchFailure::SubmitError, e))?;
        button
            .click()
            .await
            .map_err(|e| self.fail(SearchFailure::SubmitError, e))?;

        self.transition(SearchState::AwaitingLoad);
        self.page
            .wait_for_load_state(self.timeouts.load)
            .await
            .map_err(|e| self.fail(SearchFailure::LoadTimeout, e))?;

        self.transition(SearchState::Ready);
        tracing::info!("Search for '{}' is ready at {}", query, self.page.url());
        Ok(())
    }

    fn transition(&mut self, next: SearchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal search transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("Search state: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, reason: SearchFailure, error: PageError) -> ScoutError {
        tracing::error!("Search failed while {}: {}", self.state, error);
        self.transition(SearchState::Failed(reason));
        ScoutError::SearchStage {
            reason,
            detail: error.to_string(),
        }
    }
}
