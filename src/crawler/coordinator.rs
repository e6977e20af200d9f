//! Crawl coordination
//!
//! One crawl walks the frontier of a single site:
//! - normalizes the root and seeds the frontier
//! - fetches each URL through the fetch ladder
//! - turns pages into text and page-level name candidates
//! - queues internal links and records external ones
//! - runs corpus-level extraction and validation once at the end

use crate::config::Config;
use crate::crawler::fetcher::{FetchLadder, FetchResult, FetchedPage};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{parse_html, LinkSet};
use crate::crawler::transport::Tier;
use crate::names::{CandidateSet, NameExtractor, NameValidator};
use crate::text;
use crate::url::{normalize_root, registrable_domain};
use crate::WhoseError;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::Instrument;
use url::Url;

/// Text captured from one crawled page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub url: Url,
    pub final_url: Url,
    pub title: Option<String>,
    pub text: String,
    pub tier: Tier,
    pub discovered_at: DateTime<Utc>,
}

/// Everything learned from one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Normalized root; `None` when the input could not be used
    pub root: Option<Url>,
    pub names: BTreeSet<String>,
    /// Text of every page, in crawl order
    pub full_text: String,
    pub visited: BTreeSet<Url>,
    pub internal_links: BTreeSet<Url>,
    pub external_links: BTreeSet<Url>,
    pub pages: Vec<PageRecord>,
}

impl CrawlReport {
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty() && self.names.is_empty() && self.pages.is_empty()
    }
}

/// Mutable state owned by a single crawl call
struct CrawlState {
    root_domain: String,
    frontier: Frontier,
    links: LinkSet,
    pages: Vec<PageRecord>,
    candidates: CandidateSet,
}

/// Site crawler producing validated person names
///
/// The crawler holds no per-crawl state, so one instance can serve several
/// crawls at once.
#[derive(Debug)]
pub struct Crawler {
    ladder: FetchLadder,
    extractor: NameExtractor,
    validator: NameValidator,
    max_pages: usize,
    span: tracing::Span,
}

impl Crawler {
    /// Creates a crawler with the network transports and default recognizers
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(WhoseError::NerUnavailable)` - No recognizer backend could be loaded
    /// * `Err(WhoseError::Http)` - HTTP clients could not be built
    pub fn new(config: &Config) -> Result<Self, WhoseError> {
        let ladder = FetchLadder::from_config(config)?;
        let extractor = NameExtractor::from_config(&config.extraction)?;
        let validator = NameValidator::new()
            .with_extra_exclusions(config.extraction.extra_exclusions.iter().cloned());

        Ok(Self::from_parts(ladder, extractor, validator).with_max_pages(config.crawler.max_pages))
    }

    pub fn from_parts(
        ladder: FetchLadder,
        extractor: NameExtractor,
        validator: NameValidator,
    ) -> Self {
        Self {
            ladder,
            extractor,
            validator,
            max_pages: 20,
            span: tracing::Span::none(),
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Page limit used when the caller has no explicit one
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn extractor(&self) -> &NameExtractor {
        &self.extractor
    }

    pub fn validator(&self) -> &NameValidator {
        &self.validator
    }

    /// Crawls `domain`, visiting at most `max_pages` URLs
    ///
    /// A malformed root or a zero page limit yields an empty report. Fetch
    /// failures on individual pages are logged and skipped.
    pub async fn crawl(&self, domain: &str, max_pages: usize) -> CrawlReport {
        let root = domain.trim();
        let span = if self.span.is_none() {
            tracing::info_span!("crawl", root = %root)
        } else {
            tracing::info_span!(parent: &self.span, "crawl", root = %root)
        };
        self.run(domain, max_pages).instrument(span).await
    }

    async fn run(&self, domain: &str, max_pages: usize) -> CrawlReport {
        if max_pages == 0 {
            tracing::info!("Page limit is zero, nothing to crawl");
            return CrawlReport::default();
        }

        let root = match normalize_root(domain) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Ignoring root {:?}: {}", domain, e);
                return CrawlReport::default();
            }
        };

        let Some(root_domain) = registrable_domain(&root) else {
            tracing::warn!("No registrable domain for {}", root);
            return CrawlReport::default();
        };

        tracing::info!("Starting crawl of {} (limit {} pages)", root, max_pages);
        let start_time = std::time::Instant::now();

        let mut state = CrawlState {
            root_domain,
            frontier: Frontier::with_root(root.clone()),
            links: LinkSet::default(),
            pages: Vec::new(),
            candidates: CandidateSet::new(),
        };

        while state.frontier.visited_count() < max_pages {
            let Some(url) = state.frontier.pop() else {
                tracing::debug!("Frontier is empty");
                break;
            };

            if !state.frontier.mark_visited(url.clone()) {
                continue;
            }

            tracing::debug!("Processing URL: {}", url);
            match self.ladder.fetch(&url).await {
                FetchResult::Success(page) => self.absorb(page, &mut state),
                _ => tracing::warn!("Skipping {}: no fetch strategy succeeded", url),
            }

            debug_assert!(state.frontier.is_disjoint());
            debug_assert!(state.links.is_disjoint());
        }

        let report = self.finish(root, state);

        tracing::info!(
            "Crawl completed: {} pages visited, {} names found in {:?}",
            report.visited.len(),
            report.names.len(),
            start_time.elapsed()
        );

        report
    }

    /// Folds one fetched page into the crawl state
    fn absorb(&self, page: FetchedPage, state: &mut CrawlState) {
        if registrable_domain(&page.final_url).as_deref() != Some(state.root_domain.as_str()) {
            tracing::info!(
                "{} left the site for {}, recording as external",
                page.requested,
                page.final_url
            );
            state.links.external.insert(page.final_url);
            return;
        }

        if page.final_url != page.requested
            && !state.frontier.record_redirect(page.final_url.clone())
        {
            tracing::debug!(
                "{} redirected to already seen {}, skipping",
                page.requested,
                page.final_url
            );
            return;
        }

        let text = text::normalize(&page.body);
        if text.is_empty() {
            let error = WhoseError::NoTextExtracted {
                url: page.final_url.to_string(),
            };
            tracing::debug!("{}", error);
        } else {
            state.candidates.merge(self.extractor.extract_page(&text));
        }

        let parsed = parse_html(&page.body, &page.final_url);
        let mut queued = 0;
        for link in parsed.links {
            if state.links.insert(&state.root_domain, link.clone()) && state.frontier.push(link) {
                queued += 1;
            }
        }
        tracing::debug!(
            "{}: {} chars of text, {} new URLs queued",
            page.final_url,
            text.len(),
            queued
        );

        state.pages.push(PageRecord {
            url: page.requested,
            final_url: page.final_url,
            title: parsed.title,
            text,
            tier: page.tier,
            discovered_at: Utc::now(),
        });
    }

    fn finish(&self, root: Url, state: CrawlState) -> CrawlReport {
        let CrawlState {
            frontier,
            links,
            pages,
            mut candidates,
            ..
        } = state;

        let full_text = pages
            .iter()
            .map(|page| page.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        candidates.merge(self.extractor.extract_corpus(&full_text));
        let names = self.validator.validate(candidates.texts());
        tracing::debug!("{} candidates, {} validated", candidates.len(), names.len());

        CrawlReport {
            root: Some(root),
            names,
            full_text,
            visited: frontier.into_visited(),
            internal_links: links.internal,
            external_links: links.external,
            pages,
        }
    }
}
