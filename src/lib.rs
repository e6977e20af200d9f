//! Whose-Domain: domain ownership attribution
//!
//! This crate crawls a single website with an escalating set of fetch
//! strategies, extracts candidate person names from the page text, validates
//! them, and merges the result with external signals such as the site's TLS
//! certificate subject and WHOIS registrant data.

pub mod attribution;
pub mod config;
pub mod crawler;
pub mod names;
pub mod text;
pub mod url;

use thiserror::Error;

/// Main error type for Whose-Domain operations
#[derive(Debug, Error)]
pub enum WhoseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Access forbidden for {url}")]
    FetchBlocked { url: String },

    #[error("Transient fetch failure for {url}: {reason}")]
    FetchTransient { url: String, reason: String },

    #[error("All fetch strategies exhausted for {url}")]
    FetchExhausted { url: String },

    #[error("No text extracted from {url}")]
    NoTextExtracted { url: String },

    #[error("No person recognizer could be loaded: {0}")]
    NerUnavailable(String),

    #[error("Headless render failed for {url}: {message}")]
    Render { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("WHOIS lookup failed for {domain}: {message}")]
    Whois { domain: String, message: String },

    #[error("Certificate lookup failed for {domain}: {message}")]
    Certificate { domain: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Whose-Domain operations
pub type Result<T> = std::result::Result<T, WhoseError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use attribution::{attribute, AttributionReport};
pub use config::Config;
pub use crawler::{CrawlReport, Crawler};
pub use names::{NameExtractor, NameValidator};
pub use self::url::{normalize_root, registrable_domain};
