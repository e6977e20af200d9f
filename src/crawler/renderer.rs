//! Headless browser rendering, the last rung of the fetch ladder

use crate::config::RenderConfig;
use crate::WhoseError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Document captured from a rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the browser ended up on
    pub final_url: Url,
    pub html: String,
}

/// Renders a page in a browser session scoped to the call
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url, user_agent: &str) -> Result<RenderedPage, WhoseError>;
}

/// Chromium driven through the DevTools protocol
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    chrome_path: Option<PathBuf>,
    settle: Duration,
    timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(chrome_path: Option<PathBuf>, settle: Duration, timeout: Duration) -> Self {
        Self {
            chrome_path,
            settle,
            timeout,
        }
    }

    /// Returns `None` when rendering is disabled
    pub fn from_config(config: &RenderConfig, request_timeout: Duration) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(
                config.chrome_path.clone(),
                Duration::from_secs(config.settle_secs),
                request_timeout,
            )
        })
    }

    fn browser_config(&self, user_agent: &str) -> Result<BrowserConfig, String> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", user_agent));

        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder.build()
    }

    async fn capture(&self, browser: &Browser, url: &Url) -> Result<RenderedPage, String> {
        let page = tokio::time::timeout(self.timeout, browser.new_page(url.as_str()))
            .await
            .map_err(|_| format!("navigation timed out after {:?}", self.timeout))?
            .map_err(|e| format!("navigation failed: {}", e))?;

        tokio::time::sleep(self.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| format!("failed to read document: {}", e))?;

        if html.trim().is_empty() {
            return Err("empty document".to_string());
        }

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(RenderedPage { final_url, html })
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &Url, user_agent: &str) -> Result<RenderedPage, WhoseError> {
        let failure = |message: String| WhoseError::Render {
            url: url.to_string(),
            message,
        };

        let config = self.browser_config(user_agent).map_err(failure)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| failure(format!("failed to launch Chromium: {}", e)))?;

        let pump = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.capture(&browser, url).await;

        // Released on every path, including capture failures
        if let Err(e) = browser.close().await {
            tracing::debug!("Browser close failed for {}: {}", url, e);
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser wait failed for {}: {}", url, e);
        }
        pump.abort();

        result.map_err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_disabled() {
        let config = RenderConfig {
            enabled: false,
            ..RenderConfig::default()
        };
        assert!(ChromiumRenderer::from_config(&config, Duration::from_secs(20)).is_none());
    }

    #[test]
    fn test_from_config_enabled() {
        let config = RenderConfig::default();
        let renderer = ChromiumRenderer::from_config(&config, Duration::from_secs(20)).unwrap();
        assert_eq!(renderer.settle, Duration::from_secs(5));
        assert_eq!(renderer.timeout, Duration::from_secs(20));
    }
}
