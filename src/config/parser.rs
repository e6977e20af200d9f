use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use whose_domain::config::load_config;
///
/// let config = load_config(Path::new("whose-domain.toml")).unwrap();
/// println!("Attempts per tier: {}", config.fetch.attempts_per_tier);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration at `path` if one was given, otherwise the defaults
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-pages = 40

[fetch]
attempts-per-tier = 3
retry-delay-min-secs = 4
retry-delay-max-secs = 8
request-timeout-secs = 15

[render]
enabled = false
settle-secs = 2
chrome-path = "/usr/bin/chromium"

[extraction]
extra-exclusions = ["Gallery", "shop"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_pages, 40);
        assert_eq!(config.fetch.attempts_per_tier, 3);
        assert_eq!(config.fetch.retry_delay_min_secs, 4);
        assert_eq!(config.fetch.max_redirects, 10);
        assert!(!config.render.enabled);
        assert_eq!(
            config.render.chrome_path.as_deref(),
            Some(Path::new("/usr/bin/chromium"))
        );
        assert_eq!(config.extraction.extra_exclusions.len(), 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawler.max_pages, 20);
        assert_eq!(config.fetch.attempts_per_tier, 5);
        assert_eq!(config.fetch.retry_delay_min_secs, 3);
        assert_eq!(config.fetch.retry_delay_max_secs, 10);
        assert_eq!(config.fetch.request_timeout_secs, 20);
        assert!(config.render.enabled);
        assert_eq!(config.render.settle_secs, 5);
        assert!(config.extraction.given_names_path.is_none());
    }

    #[test]
    fn test_no_path_gives_defaults() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.crawler.max_pages, 20);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/whose-domain.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[fetch]
retry-delay-min-secs = 12
retry-delay-max-secs = 10
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
