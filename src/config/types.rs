use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Whose-Domain
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    pub render: RenderConfig,
    pub extraction: ExtractionConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages visited per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self { max_pages: 20 }
    }
}

/// Retry and transport configuration for the fetch ladder
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts made on each HTTP tier before escalating
    #[serde(rename = "attempts-per-tier")]
    pub attempts_per_tier: u32,

    /// Lower bound of the jittered delay before a retry (seconds)
    #[serde(rename = "retry-delay-min-secs")]
    pub retry_delay_min_secs: u64,

    /// Upper bound of the jittered delay before a retry (seconds)
    #[serde(rename = "retry-delay-max-secs")]
    pub retry_delay_max_secs: u64,

    /// Timeout applied to every HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempts_per_tier: 5,
            retry_delay_min_secs: 3,
            retry_delay_max_secs: 10,
            request_timeout_secs: 20,
            max_redirects: 10,
        }
    }
}

/// Headless render fallback configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Whether the headless fallback is attempted at all
    pub enabled: bool,

    /// Time given to client-side scripts before the DOM is captured (seconds)
    #[serde(rename = "settle-secs")]
    pub settle_secs: u64,

    /// Explicit Chromium binary; auto-detected when absent
    #[serde(rename = "chrome-path")]
    pub chrome_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settle_secs: 5,
            chrome_path: None,
        }
    }
}

/// Name extraction configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extra given names for the gazetteer recognizer, one per line
    #[serde(rename = "given-names-path")]
    pub given_names_path: Option<PathBuf>,

    /// Additional navigation/boilerplate terms rejected by the validator
    #[serde(rename = "extra-exclusions")]
    pub extra_exclusions: Vec<String>,
}
