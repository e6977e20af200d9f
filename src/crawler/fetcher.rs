//! Escalating fetch ladder
//!
//! A fetch walks through the tiers in order:
//!
//! | Tier | Attempts | Leaves the tier when |
//! |------|----------|----------------------|
//! | Direct | up to `attempts-per-tier` | 200, 403 (immediate escalation), or budget spent |
//! | Bypass | up to `attempts-per-tier` | 200 or budget spent |
//! | Render | once | always |
//!
//! Every attempt after the first of a call waits a jittered delay and carries
//! a fresh (User-Agent, Referer) pair.

use crate::config::Config;
use crate::crawler::headers::{HeaderRotation, HeaderSource, RotatingAgents};
use crate::crawler::renderer::{ChromiumRenderer, PageRenderer};
use crate::crawler::transport::{
    bypass_transport, DirectClient, FetchRequest, PageTransport, Tier, TransportResponse,
};
use crate::WhoseError;
use rand::Rng;
use std::time::Duration;
use tracing::Instrument;
use url::Url;

/// Outcome of a fetch attempt or of a whole ladder run
///
/// Per-attempt classification yields `Blocked` or `TransientFailure`; the
/// ladder itself only ever returns `Success` or `Exhausted`.
#[derive(Debug)]
pub enum FetchResult {
    Success(FetchedPage),
    /// HTTP 403
    Blocked,
    TransientFailure {
        reason: String,
    },
    Exhausted,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A page successfully retrieved by one of the tiers
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested: Url,
    /// URL after redirects
    pub final_url: Url,
    pub body: String,
    pub tier: Tier,
}

/// Classifies the outcome of a single transport call
pub fn classify(
    request: &FetchRequest,
    outcome: Result<TransportResponse, WhoseError>,
) -> FetchResult {
    match outcome {
        Ok(response) if response.status == 200 => FetchResult::Success(FetchedPage {
            requested: request.url.clone(),
            final_url: response.final_url,
            body: response.body,
            tier: request.tier,
        }),
        Ok(response) if response.status == 403 => FetchResult::Blocked,
        Ok(response) => FetchResult::TransientFailure {
            reason: format!("HTTP {}", response.status),
        },
        Err(e) => FetchResult::TransientFailure {
            reason: e.to_string(),
        },
    }
}

/// Attempt budget and backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts_per_tier: u32,
    pub delay_min: Duration,
    pub delay_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_tier: 5,
            delay_min: Duration::from_secs(3),
            delay_max: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts_per_tier: config.fetch.attempts_per_tier,
            delay_min: Duration::from_secs(config.fetch.retry_delay_min_secs),
            delay_max: Duration::from_secs(config.fetch.retry_delay_max_secs),
        }
    }

    /// Draws a delay uniformly from `[delay_min, delay_max]`
    pub fn jittered_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.delay_min.as_millis() as u64;
        let max = (self.delay_max.as_millis() as u64).max(min);
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

/// Position of a fetch call on the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderState {
    Direct { attempt: u32 },
    Bypass { attempt: u32 },
    Render,
    Exhausted,
}

impl LadderState {
    pub fn start() -> Self {
        Self::Direct { attempt: 1 }
    }

    /// Next state after an unsuccessful attempt in this state
    pub fn advance(self, outcome: &FetchResult, attempts_per_tier: u32) -> Self {
        match self {
            Self::Direct { .. } if matches!(outcome, FetchResult::Blocked) => {
                Self::Bypass { attempt: 1 }
            }
            Self::Direct { attempt } if attempt < attempts_per_tier => Self::Direct {
                attempt: attempt + 1,
            },
            Self::Direct { .. } => Self::Bypass { attempt: 1 },
            Self::Bypass { attempt } if attempt < attempts_per_tier => Self::Bypass {
                attempt: attempt + 1,
            },
            Self::Bypass { .. } => Self::Render,
            Self::Render | Self::Exhausted => Self::Exhausted,
        }
    }
}

/// Retrieves one URL through the escalating tiers
pub struct FetchLadder {
    direct: Box<dyn PageTransport>,
    bypass: Box<dyn PageTransport>,
    renderer: Option<Box<dyn PageRenderer>>,
    headers: Box<dyn HeaderSource>,
    policy: RetryPolicy,
    span: tracing::Span,
}

impl std::fmt::Debug for FetchLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchLadder")
            .field("policy", &self.policy)
            .field("renders", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl FetchLadder {
    pub fn new(
        direct: Box<dyn PageTransport>,
        bypass: Box<dyn PageTransport>,
        headers: Box<dyn HeaderSource>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            direct,
            bypass,
            renderer: None,
            headers,
            policy,
            span: tracing::Span::none(),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Builds the ladder with the reqwest transports and, when enabled, the
    /// Chromium renderer
    pub fn from_config(config: &Config) -> Result<Self, WhoseError> {
        let mut ladder = Self::new(
            Box::new(DirectClient::new(&config.fetch)?),
            bypass_transport(&config.fetch)?,
            Box::new(RotatingAgents::new()),
            RetryPolicy::from_config(config),
        );

        let timeout = Duration::from_secs(config.fetch.request_timeout_secs);
        if let Some(renderer) = ChromiumRenderer::from_config(&config.render, timeout) {
            ladder = ladder.with_renderer(Box::new(renderer));
        }

        Ok(ladder)
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches `url`, returning `Success` or `Exhausted`
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let span = if self.span.is_none() {
            tracing::debug_span!("fetch", url = %url)
        } else {
            tracing::debug_span!(parent: &self.span, "fetch", url = %url)
        };
        self.climb(url).instrument(span).await
    }

    async fn climb(&self, url: &Url) -> FetchResult {
        let mut rotation = HeaderRotation::new(self.headers.as_ref());
        let mut state = LadderState::start();
        let mut first_attempt = true;

        loop {
            let (tier, attempt) = match state {
                LadderState::Direct { attempt } => (Tier::Direct, attempt),
                LadderState::Bypass { attempt } => (Tier::Bypass, attempt),
                LadderState::Render if self.renderer.is_some() => (Tier::Render, 1),
                LadderState::Render | LadderState::Exhausted => {
                    let error = WhoseError::FetchExhausted {
                        url: url.to_string(),
                    };
                    tracing::warn!("{}", error);
                    return FetchResult::Exhausted;
                }
            };

            if !first_attempt {
                let delay = self.policy.jittered_delay(&mut rand::thread_rng());
                tracing::debug!("Waiting {:?} before {} attempt {}", delay, tier, attempt);
                tokio::time::sleep(delay).await;
            }
            first_attempt = false;

            let headers = rotation.next_headers();
            let request = FetchRequest {
                url: url.clone(),
                attempt,
                tier,
            };

            let outcome = match tier {
                Tier::Direct => {
                    classify(&request, self.direct.get(&request, headers.to_header_map()).await)
                }
                Tier::Bypass => {
                    classify(&request, self.bypass.get(&request, headers.to_header_map()).await)
                }
                Tier::Render => self.render(&request, &headers.user_agent).await,
            };

            match &outcome {
                FetchResult::Success(page) => {
                    tracing::debug!("Fetched {} via {} (attempt {})", url, tier, attempt);
                    if page.final_url != page.requested {
                        tracing::debug!("{} redirected to {}", page.requested, page.final_url);
                    }
                    return outcome;
                }
                FetchResult::Blocked => {
                    let error = WhoseError::FetchBlocked {
                        url: url.to_string(),
                    };
                    tracing::info!("{} ({} attempt {})", error, tier, attempt);
                }
                FetchResult::TransientFailure { reason } => {
                    tracing::debug!("{} attempt {} failed for {}: {}", tier, attempt, url, reason);
                }
                FetchResult::Exhausted => {}
            }

            let next = state.advance(&outcome, self.policy.attempts_per_tier);
            if next == LadderState::Render && self.renderer.is_some() {
                tracing::info!("HTTP tiers exhausted for {}, rendering", url);
            }
            state = next;
        }
    }

    async fn render(&self, request: &FetchRequest, user_agent: &str) -> FetchResult {
        let Some(renderer) = &self.renderer else {
            return FetchResult::Exhausted;
        };

        match renderer.render(&request.url, user_agent).await {
            Ok(rendered) => FetchResult::Success(FetchedPage {
                requested: request.url.clone(),
                final_url: rendered.final_url,
                body: rendered.html,
                tier: Tier::Render,
            }),
            Err(e) => {
                tracing::warn!("{}", e);
                FetchResult::TransientFailure {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::headers::FixedPool;
    use crate::crawler::testing::{CallLog, FailingTransport, StaticRenderer, StatusTransport};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::time::Instant;

    fn url() -> Url {
        Url::parse("https://example.com/team").unwrap()
    }

    fn ladder(direct: Box<dyn PageTransport>, bypass: Box<dyn PageTransport>) -> FetchLadder {
        FetchLadder::new(
            direct,
            bypass,
            Box::new(FixedPool::seeded(7)),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn test_classify() {
        let request = FetchRequest {
            url: url(),
            attempt: 1,
            tier: Tier::Direct,
        };
        let response = |status| {
            Ok(TransportResponse {
                status,
                final_url: url(),
                body: "<p>hi</p>".to_string(),
            })
        };

        assert!(classify(&request, response(200)).is_success());
        assert!(matches!(classify(&request, response(403)), FetchResult::Blocked));
        assert!(matches!(
            classify(&request, response(503)),
            FetchResult::TransientFailure { .. }
        ));
        assert!(matches!(
            classify(
                &request,
                Err(WhoseError::FetchTransient {
                    url: url().to_string(),
                    reason: "timeout".to_string()
                })
            ),
            FetchResult::TransientFailure { .. }
        ));
    }

    #[test]
    fn test_ladder_transitions() {
        let blocked = FetchResult::Blocked;
        let failed = FetchResult::TransientFailure {
            reason: "HTTP 500".to_string(),
        };

        assert_eq!(
            LadderState::Direct { attempt: 1 }.advance(&blocked, 5),
            LadderState::Bypass { attempt: 1 }
        );
        assert_eq!(
            LadderState::Direct { attempt: 1 }.advance(&failed, 5),
            LadderState::Direct { attempt: 2 }
        );
        assert_eq!(
            LadderState::Direct { attempt: 5 }.advance(&failed, 5),
            LadderState::Bypass { attempt: 1 }
        );
        assert_eq!(
            LadderState::Bypass { attempt: 2 }.advance(&blocked, 5),
            LadderState::Bypass { attempt: 3 }
        );
        assert_eq!(
            LadderState::Bypass { attempt: 5 }.advance(&failed, 5),
            LadderState::Render
        );
        assert_eq!(LadderState::Render.advance(&failed, 5), LadderState::Exhausted);
    }

    #[test]
    fn test_jittered_delay_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let delay = policy.jittered_delay(&mut rng);
            assert!(delay >= Duration::from_secs(3));
            assert!(delay <= Duration::from_secs(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_has_no_delay() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(StatusTransport::new(200).with_log(log.clone())),
            Box::new(StatusTransport::new(200).with_log(log.clone())),
        );

        let start = Instant::now();
        let result = ladder.fetch(&url()).await;

        assert!(result.is_success());
        assert_eq!(log.len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_escalates_once_to_bypass() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(StatusTransport::new(403).with_log(log.clone())),
            Box::new(StatusTransport::new(200).with_log(log.clone())),
        );

        let result = ladder.fetch(&url()).await;

        match result {
            FetchResult::Success(page) => assert_eq!(page.tier, Tier::Bypass),
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(log.tiers(), vec![Tier::Direct, Tier::Bypass]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_bypass_never_returns_to_direct() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(StatusTransport::new(403).with_log(log.clone())),
            Box::new(StatusTransport::new(403).with_log(log.clone())),
        );

        let result = ladder.fetch(&url()).await;

        assert!(matches!(result, FetchResult::Exhausted));
        let tiers = log.tiers();
        assert_eq!(tiers.iter().filter(|t| **t == Tier::Direct).count(), 1);
        assert_eq!(tiers.iter().filter(|t| **t == Tier::Bypass).count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retries_within_tier() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(StatusTransport::scripted(vec![500, 502, 200]).with_log(log.clone())),
            Box::new(StatusTransport::new(200).with_log(log.clone())),
        );

        let start = Instant::now();
        let result = ladder.fetch(&url()).await;

        assert!(result.is_success());
        assert_eq!(log.tiers(), vec![Tier::Direct; 3]);
        assert_eq!(log.attempts(), vec![1, 2, 3]);

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(20), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_between_attempts_is_bounded() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(FailingTransport::new().with_log(log.clone())),
            Box::new(FailingTransport::new().with_log(log.clone())),
        );

        ladder.fetch(&url()).await;

        let times = log.times();
        assert_eq!(times.len(), 10);
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_secs(3), "{:?}", gap);
            assert!(gap <= Duration::from_secs(10), "{:?}", gap);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_after_http_tiers() {
        let log = CallLog::default();
        let renderer = StaticRenderer::new(Some("<p>Rendered</p>"));
        let ladder = ladder(
            Box::new(FailingTransport::new().with_log(log.clone())),
            Box::new(StatusTransport::new(503).with_log(log.clone())),
        )
        .with_renderer(Box::new(renderer.clone()));

        let result = ladder.fetch(&url()).await;

        match result {
            FetchResult::Success(page) => {
                assert_eq!(page.tier, Tier::Render);
                assert_eq!(page.body, "<p>Rendered</p>");
            }
            other => panic!("expected rendered page, got {:?}", other),
        }
        assert_eq!(log.len(), 10);
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_exhausts() {
        let renderer = StaticRenderer::new(None);
        let ladder = ladder(Box::new(FailingTransport::new()), Box::new(FailingTransport::new()))
            .with_renderer(Box::new(renderer.clone()));

        let result = ladder.fetch(&url()).await;

        assert!(matches!(result, FetchResult::Exhausted));
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_renderer_exhausts() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(FailingTransport::new().with_log(log.clone())),
            Box::new(FailingTransport::new().with_log(log.clone())),
        );

        let result = ladder.fetch(&url()).await;

        assert!(matches!(result, FetchResult::Exhausted));
        assert_eq!(log.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_headers_change_between_attempts() {
        let log = CallLog::default();
        let ladder = ladder(
            Box::new(FailingTransport::new().with_log(log.clone())),
            Box::new(FailingTransport::new().with_log(log.clone())),
        );

        ladder.fetch(&url()).await;

        let pairs = log.header_pairs();
        assert_eq!(pairs.len(), 10);
        for pair in pairs.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
