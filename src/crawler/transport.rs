//! HTTP transports for the direct and bypass tiers
//!
//! Both tiers issue a single GET per call; retry and escalation belong to the
//! fetch ladder. With the `impersonate` feature the bypass tier is served by
//! [`ImpersonatingClient`], which reproduces a Chrome TLS and HTTP/2
//! fingerprint; otherwise [`BypassClient`] is used. Redirects are followed and the final URL is reported so the
//! crawler can classify the page where it actually landed.

use crate::config::FetchConfig;
use crate::WhoseError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// One rung of the fetch ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Plain client with randomized browser headers
    Direct,
    /// Cookie-keeping client that presents as Chrome
    Bypass,
    /// Headless browser render
    Render,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Bypass => write!(f, "bypass"),
            Self::Render => write!(f, "render"),
        }
    }
}

/// A single retrieval attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    /// 1-based attempt number within the tier
    pub attempt: u32,
    pub tier: Tier,
}

/// Raw response of one attempt
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// URL after redirects
    pub final_url: Url,
    /// Body text; only read for successful responses
    pub body: String,
}

/// A network transport able to perform one GET with custom headers
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError>;
}

/// Builds the shared reqwest client configuration
///
/// # Arguments
///
/// * `config` - Fetch configuration (timeouts and redirect limit)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    client_builder(config).build()
}

fn client_builder(config: &FetchConfig) -> reqwest::ClientBuilder {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .deflate(true)
}

async fn send(
    client: &Client,
    request: &FetchRequest,
    headers: HeaderMap,
) -> Result<TransportResponse, WhoseError> {
    let response = client
        .get(request.url.clone())
        .headers(headers)
        .send()
        .await
        .map_err(|e| transient(&request.url, &e))?;

    let status = response.status();
    let final_url = response.url().clone();

    let body = if status == StatusCode::OK {
        response
            .text()
            .await
            .map_err(|e| transient(&request.url, &e))?
    } else {
        String::new()
    };

    Ok(TransportResponse {
        status: status.as_u16(),
        final_url,
        body,
    })
}

fn transient(url: &Url, error: &reqwest::Error) -> WhoseError {
    let reason = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_redirect() {
        "redirect limit exceeded".to_string()
    } else {
        error.to_string()
    };

    WhoseError::FetchTransient {
        url: url.to_string(),
        reason,
    }
}

/// Plain reqwest client
pub struct DirectClient {
    client: Client,
}

impl DirectClient {
    pub fn new(config: &FetchConfig) -> Result<Self, WhoseError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl PageTransport for DirectClient {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError> {
        send(&self.client, request, headers).await
    }
}

/// Client aimed at common edge-protection checks
///
/// Keeps a cookie jar across attempts so challenge cookies set on a denial are
/// replayed, sends the Chromium client-hint headers those checks look for, and
/// visits the site origin first to pick up session cookies before requesting a
/// deep link.
pub struct BypassClient {
    client: Client,
}

impl BypassClient {
    pub fn new(config: &FetchConfig) -> Result<Self, WhoseError> {
        let client = client_builder(config)
            .cookie_store(true)
            .default_headers(client_hints())
            .build()?;
        Ok(Self { client })
    }

    async fn prime(&self, url: &Url, headers: &HeaderMap) {
        match self
            .client
            .get(site_origin(url))
            .headers(headers.clone())
            .send()
            .await
        {
            Ok(response) => {
                tracing::debug!("Primed session for {} ({})", url, response.status())
            }
            Err(e) => tracing::debug!("Session priming failed for {}: {}", url, e),
        }
    }
}

#[async_trait]
impl PageTransport for BypassClient {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError> {
        if needs_priming(request) {
            self.prime(&request.url, &headers).await;
        }
        send(&self.client, request, headers).await
    }
}

/// Deep links are requested after a visit to the origin on the first attempt
fn needs_priming(request: &FetchRequest) -> bool {
    request.attempt == 1 && request.url.path() != "/"
}

fn site_origin(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin
}

/// Browser-impersonating client for the bypass tier
///
/// Emulates Chrome down to the TLS handshake and HTTP/2 settings, so edge
/// checks that fingerprint the connection see a browser rather than a
/// library client. Cookies and origin priming work as in [`BypassClient`].
#[cfg(feature = "impersonate")]
pub struct ImpersonatingClient {
    client: wreq::Client,
}

#[cfg(feature = "impersonate")]
impl ImpersonatingClient {
    pub fn new(config: &FetchConfig) -> Result<Self, WhoseError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = wreq::Client::builder()
            .emulation(wreq_util::Emulation::Chrome131)
            .cookie_store(true)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(wreq::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| WhoseError::ClientSetup(e.to_string()))?;
        Ok(Self { client })
    }

    fn request(&self, url: &Url, headers: &HeaderMap) -> wreq::RequestBuilder {
        let mut builder = self.client.get(url.as_str());
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        builder
    }
}

#[cfg(feature = "impersonate")]
#[async_trait]
impl PageTransport for ImpersonatingClient {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError> {
        if needs_priming(request) {
            let origin = site_origin(&request.url);
            match self.request(&origin, &headers).send().await {
                Ok(response) => tracing::debug!(
                    "Primed session for {} ({})",
                    request.url,
                    response.status()
                ),
                Err(e) => tracing::debug!("Session priming failed for {}: {}", request.url, e),
            }
        }

        let failed = |e: wreq::Error| WhoseError::FetchTransient {
            url: request.url.to_string(),
            reason: if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                "connection failed".to_string()
            } else {
                e.to_string()
            },
        };

        let response = self.request(&request.url, &headers).send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let final_url = Url::parse(response.url().as_str()).unwrap_or_else(|_| request.url.clone());
        let body = if status == 200 {
            response.text().await.map_err(failed)?
        } else {
            String::new()
        };

        Ok(TransportResponse {
            status,
            final_url,
            body,
        })
    }
}

/// Transport used for the bypass tier in this build
pub fn bypass_transport(config: &FetchConfig) -> Result<Box<dyn PageTransport>, WhoseError> {
    #[cfg(feature = "impersonate")]
    {
        Ok(Box::new(ImpersonatingClient::new(config)?))
    }
    #[cfg(not(feature = "impersonate"))]
    {
        Ok(Box::new(BypassClient::new(config)?))
    }
}

fn client_hints() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
        ),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_build_transports() {
        let config = FetchConfig::default();
        assert!(DirectClient::new(&config).is_ok());
        assert!(BypassClient::new(&config).is_ok());
    }

    #[test]
    fn test_bypass_transport_builds() {
        assert!(bypass_transport(&FetchConfig::default()).is_ok());
    }

    #[cfg(feature = "impersonate")]
    #[test]
    fn test_build_impersonating_client() {
        assert!(ImpersonatingClient::new(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_priming_only_for_deep_first_attempts() {
        let request = |url: &str, attempt| FetchRequest {
            url: Url::parse(url).unwrap(),
            attempt,
            tier: Tier::Bypass,
        };
        assert!(needs_priming(&request("https://example.com/team/bio", 1)));
        assert!(!needs_priming(&request("https://example.com/team/bio", 2)));
        assert!(!needs_priming(&request("https://example.com/", 1)));
        assert_eq!(
            site_origin(&Url::parse("https://example.com/team?x=1").unwrap()).as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_client_hints() {
        let hints = client_hints();
        assert_eq!(hints["sec-ch-ua-mobile"], "?0");
        assert!(hints.contains_key("sec-ch-ua"));
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Direct.to_string(), "direct");
        assert_eq!(Tier::Bypass.to_string(), "bypass");
        assert_eq!(Tier::Render.to_string(), "render");
    }
}
