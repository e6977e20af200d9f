use crate::config::types::{Config, CrawlerConfig, FetchConfig, RenderConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_render_config(&config.render)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.attempts_per_tier < 1 || config.attempts_per_tier > 20 {
        return Err(ConfigError::Validation(format!(
            "attempts_per_tier must be between 1 and 20, got {}",
            config.attempts_per_tier
        )));
    }

    if config.retry_delay_min_secs > config.retry_delay_max_secs {
        return Err(ConfigError::Validation(format!(
            "retry_delay_min_secs ({}) must not exceed retry_delay_max_secs ({})",
            config.retry_delay_min_secs, config.retry_delay_max_secs
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_redirects > 50 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 50, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.settle_secs > 60 {
        return Err(ConfigError::Validation(format!(
            "settle_secs must be <= 60, got {}",
            config.settle_secs
        )));
    }

    if let Some(path) = &config.chrome_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
