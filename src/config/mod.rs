//! Configuration module for Whose-Domain
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so running without a file is the same as
//! loading an empty one.
//!
//! # Example
//!
//! ```no_run
//! use whose_domain::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("whose-domain.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ExtractionConfig, FetchConfig, RenderConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
