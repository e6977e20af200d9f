//! Browser-like request headers, re-randomized on every attempt
//!
//! User-Agent and Referer values come from a pluggable [`HeaderSource`]. The
//! default source rotates real-world agents through `fake_user_agent` and
//! falls back to a fixed pool; tests inject a seeded [`FixedPool`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::sync::Mutex;

/// Browser signatures used when no dynamic rotation source is available
pub const FALLBACK_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.80",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/124.0.6367.88 Mobile/15E148 Safari/604.1",
];

/// Plausible referring sites
pub const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://search.yahoo.com/",
    "https://duckduckgo.com/",
    "https://twitter.com/",
    "https://www.linkedin.com/",
    "https://www.facebook.com/",
];

/// Redraws attempted before forcing a different referer
const MAX_REDRAWS: usize = 8;

/// Supplies the randomized parts of a request's headers
pub trait HeaderSource: Send + Sync {
    fn user_agent(&self) -> String;
    fn referer(&self) -> String;
}

/// Uniform choice from the fixed agent and referer pools
pub struct FixedPool {
    rng: Mutex<StdRng>,
}

impl Default for FixedPool {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedPool {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn choose(&self, pool: &[&str]) -> String {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        pool.choose(&mut *rng).copied().unwrap_or_default().to_string()
    }
}

impl HeaderSource for FixedPool {
    fn user_agent(&self) -> String {
        self.choose(FALLBACK_USER_AGENTS)
    }

    fn referer(&self) -> String {
        self.choose(REFERERS)
    }
}

/// Real-world agent rotation with the fixed pool as fallback
#[derive(Default)]
pub struct RotatingAgents {
    fallback: FixedPool,
}

impl RotatingAgents {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeaderSource for RotatingAgents {
    fn user_agent(&self) -> String {
        let agent = fake_user_agent::get_rua().to_string();
        if agent.trim().is_empty() {
            self.fallback.user_agent()
        } else {
            agent
        }
    }

    fn referer(&self) -> String {
        self.fallback.referer()
    }
}

/// The randomized identity of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserHeaders {
    pub user_agent: String,
    pub referer: String,
}

impl BrowserHeaders {
    /// Expands into the full browser-like header set
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        insert(&mut headers, header::USER_AGENT, &self.user_agent);
        insert(&mut headers, header::REFERER, &self.referer);
        insert(
            &mut headers,
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        );
        insert(&mut headers, header::ACCEPT_LANGUAGE, "en-US,en;q=0.5");
        insert(&mut headers, header::ACCEPT_ENCODING, "gzip, deflate, br");
        insert(&mut headers, header::DNT, "1");
        insert(&mut headers, header::CONNECTION, "keep-alive");
        insert(&mut headers, header::UPGRADE_INSECURE_REQUESTS, "1");
        insert(&mut headers, header::CACHE_CONTROL, "max-age=0");
        insert(&mut headers, header::PRAGMA, "no-cache");
        insert(&mut headers, HeaderName::from_static("sec-fetch-dest"), "document");
        insert(&mut headers, HeaderName::from_static("sec-fetch-mode"), "navigate");
        insert(&mut headers, HeaderName::from_static("sec-fetch-site"), "cross-site");
        insert(&mut headers, HeaderName::from_static("sec-fetch-user"), "?1");

        headers
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::debug!("Dropping unencodable {} header value", name),
    }
}

/// Per-fetch header generator that never repeats the previous identity
pub struct HeaderRotation<'a> {
    source: &'a dyn HeaderSource,
    last: Option<BrowserHeaders>,
}

impl<'a> HeaderRotation<'a> {
    pub fn new(source: &'a dyn HeaderSource) -> Self {
        Self { source, last: None }
    }

    pub fn next_headers(&mut self) -> BrowserHeaders {
        let mut drawn = self.draw();
        let mut redraws = 0;
        while self.last.as_ref() == Some(&drawn) && redraws < MAX_REDRAWS {
            drawn = self.draw();
            redraws += 1;
        }

        if self.last.as_ref() == Some(&drawn) {
            drawn.referer = next_referer(&drawn.referer);
        }

        self.last = Some(drawn.clone());
        drawn
    }

    fn draw(&self) -> BrowserHeaders {
        BrowserHeaders {
            user_agent: self.source.user_agent(),
            referer: self.source.referer(),
        }
    }
}

/// The pool entry after `current`, wrapping around
fn next_referer(current: &str) -> String {
    let index = REFERERS
        .iter()
        .position(|referer| *referer == current)
        .map_or(0, |i| (i + 1) % REFERERS.len());
    REFERERS[index].to_string()
}
