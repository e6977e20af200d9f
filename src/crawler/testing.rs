//! Scripted transports and renderers for ladder and crawler tests

use crate::crawler::renderer::{PageRenderer, RenderedPage};
use crate::crawler::transport::{FetchRequest, PageTransport, Tier, TransportResponse};
use crate::WhoseError;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use url::Url;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: Url,
    pub tier: Tier,
    pub attempt: u32,
    pub user_agent: String,
    pub referer: String,
    pub at: Instant,
}

/// Shared record of every transport call
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    fn record(&self, request: &FetchRequest, headers: &HeaderMap) {
        let value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        self.0.lock().unwrap().push(RecordedCall {
            url: request.url.clone(),
            tier: request.tier,
            attempt: request.attempt,
            user_agent: value(header::USER_AGENT),
            referer: value(header::REFERER),
            at: Instant::now(),
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.calls().into_iter().map(|c| c.tier).collect()
    }

    pub fn attempts(&self) -> Vec<u32> {
        self.calls().into_iter().map(|c| c.attempt).collect()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.calls().into_iter().map(|c| c.at).collect()
    }

    pub fn urls(&self) -> Vec<Url> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .map(|c| (c.user_agent, c.referer))
            .collect()
    }
}

/// Answers with scripted status codes, then repeats the last one
pub struct StatusTransport {
    statuses: Mutex<VecDeque<u16>>,
    last: Mutex<u16>,
    log: Option<CallLog>,
}

impl StatusTransport {
    pub fn new(status: u16) -> Self {
        Self::scripted(vec![status])
    }

    pub fn scripted(statuses: Vec<u16>) -> Self {
        Self {
            last: Mutex::new(statuses.first().copied().unwrap_or(200)),
            statuses: Mutex::new(statuses.into()),
            log: None,
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }
}

#[async_trait]
impl PageTransport for StatusTransport {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError> {
        if let Some(log) = &self.log {
            log.record(request, &headers);
        }

        let status = match self.statuses.lock().unwrap().pop_front() {
            Some(status) => {
                *self.last.lock().unwrap() = status;
                status
            }
            None => *self.last.lock().unwrap(),
        };

        Ok(TransportResponse {
            status,
            final_url: request.url.clone(),
            body: if status == 200 {
                "<html><body><p>Welcome</p></body></html>".to_string()
            } else {
                String::new()
            },
        })
    }
}

/// Fails every call with a transport error
#[derive(Default)]
pub struct FailingTransport {
    log: Option<CallLog>,
}

impl FailingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }
}

#[async_trait]
impl PageTransport for FailingTransport {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError> {
        if let Some(log) = &self.log {
            log.record(request, &headers);
        }
        Err(WhoseError::FetchTransient {
            url: request.url.to_string(),
            reason: "connection failed".to_string(),
        })
    }
}

enum Route {
    Page(String),
    Redirect(Url),
    Status(u16),
}

/// In-memory website keyed by absolute URL; unknown URLs answer 404
#[derive(Default)]
pub struct SiteTransport {
    routes: HashMap<Url, Route>,
    log: Option<CallLog>,
}

impl SiteTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.routes
            .insert(Url::parse(url).unwrap(), Route::Page(html.to_string()));
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.routes.insert(
            Url::parse(from).unwrap(),
            Route::Redirect(Url::parse(to).unwrap()),
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes
            .insert(Url::parse(url).unwrap(), Route::Status(status));
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }
}

#[async_trait]
impl PageTransport for SiteTransport {
    async fn get(
        &self,
        request: &FetchRequest,
        headers: HeaderMap,
    ) -> Result<TransportResponse, WhoseError> {
        if let Some(log) = &self.log {
            log.record(request, &headers);
        }

        let mut current = request.url.clone();
        for _ in 0..10 {
            match self.routes.get(&current) {
                Some(Route::Redirect(target)) => current = target.clone(),
                Some(Route::Page(html)) => {
                    return Ok(TransportResponse {
                        status: 200,
                        final_url: current,
                        body: html.clone(),
                    })
                }
                Some(Route::Status(status)) => {
                    return Ok(TransportResponse {
                        status: *status,
                        final_url: current,
                        body: String::new(),
                    })
                }
                None => {
                    return Ok(TransportResponse {
                        status: 404,
                        final_url: current,
                        body: String::new(),
                    })
                }
            }
        }

        Err(WhoseError::FetchTransient {
            url: request.url.to_string(),
            reason: "redirect limit exceeded".to_string(),
        })
    }
}

/// Renderer returning fixed markup, or failing when given `None`
#[derive(Clone)]
pub struct StaticRenderer {
    html: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticRenderer {
    pub fn new(html: Option<&str>) -> Self {
        Self {
            html: html.map(str::to_string),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    async fn render(&self, url: &Url, _user_agent: &str) -> Result<RenderedPage, WhoseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.html {
            Some(html) => Ok(RenderedPage {
                final_url: url.clone(),
                html: html.clone(),
            }),
            None => Err(WhoseError::Render {
                url: url.to_string(),
                message: "browser unavailable".to_string(),
            }),
        }
    }
}
