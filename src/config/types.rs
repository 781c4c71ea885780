use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Shelf-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub collector: CollectorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Page session timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Upper bound on loading the site's start page (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Upper bound on locating the search field and submit button (milliseconds)
    #[serde(rename = "selector-timeout-ms", default = "default_selector_timeout")]
    pub selector_timeout_ms: u64,

    /// Upper bound on waiting for the results page to settle (milliseconds)
    #[serde(rename = "load-timeout-ms", default = "default_load_timeout")]
    pub load_timeout_ms: u64,
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout(),
            selector_timeout_ms: default_selector_timeout(),
            load_timeout_ms: default_load_timeout(),
        }
    }
}

/// Extraction fan-out configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum number of product elements extracted at the same time
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Downstream collector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Base URL that response routes are appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Optional local copy of every delivered batch
    #[serde(rename = "results-path", default)]
    pub results_path: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scraper
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scraper
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

fn default_navigation_timeout() -> u64 {
    120_000
}

fn default_selector_timeout() -> u64 {
    30_000
}

fn default_load_timeout() -> u64 {
    60_000
}

fn default_max_concurrency() -> u32 {
    16
}
