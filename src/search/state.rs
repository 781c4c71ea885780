/// Search state definitions
///
/// A search moves through a fixed sequence of stages. Any non-terminal
/// stage may fail, which ends the request.
use std::fmt;

/// Why a search stopped before reaching [`SearchState::Ready`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchFailure {
    /// The search input never appeared within the selector timeout
    SearchFieldNotFound,

    /// The search input rejected the query text
    FillError,

    /// The submit control was missing or could not be activated
    SubmitError,

    /// The results page did not finish loading within the load timeout
    LoadTimeout,
}

impl SearchFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchFieldNotFound => "search_field_not_found",
            Self::FillError => "fill_error",
            Self::SubmitError => "submit_error",
            Self::LoadTimeout => "load_timeout",
        }
    }
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current stage of a search on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    // ===== Active States =====
    /// Nothing has been done on the page yet
    Idle,

    /// Locating the search input and typing the query
    FillingQuery,

    /// Locating and clicking the submit control
    SubmittingQuery,

    /// Waiting for the results page to load
    AwaitingLoad,

    // ===== Terminal States =====
    /// Results page is loaded; extraction may proceed
    Ready,

    /// The search stopped; nothing may be extracted
    Failed(SearchFailure),
}

impl SearchState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }

    /// Returns true if extraction may run against the page
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn failure(&self) -> Option<SearchFailure> {
        match self {
            Self::Failed(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal step
    ///
    /// Stages advance one at a time in order. Any active stage may fail.
    pub fn can_transition_to(&self, next: SearchState) -> bool {
        match (self, next) {
            (Self::Idle, Self::FillingQuery)
            | (Self::FillingQuery, Self::SubmittingQuery)
            | (Self::SubmittingQuery, Self::AwaitingLoad)
            | (Self::AwaitingLoad, Self::Ready) => true,
            (current, Self::Failed(_)) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::FillingQuery => write!(f, "filling_query"),
            Self::SubmittingQuery => write!(f, "submitting_query"),
            Self::AwaitingLoad => write!(f, "awaiting_load"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(reason) => write!(f, "failed({})", reason),
        }
    }
}
