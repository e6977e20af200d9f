//! Crawl frontier: URLs still to visit and URLs already visited

use std::collections::BTreeSet;
use url::Url;

/// Pending and visited URLs of one crawl
///
/// The two sets are disjoint at every point: a URL is only queued while
/// unvisited and leaves the queue when it is marked visited. Redirect
/// targets are kept as aliases of the URL that led to them; they are never
/// queued and do not count against the page limit.
#[derive(Debug, Default)]
pub struct Frontier {
    to_visit: BTreeSet<Url>,
    visited: BTreeSet<Url>,
    aliases: BTreeSet<Url>,
}

impl Frontier {
    pub fn with_root(root: Url) -> Self {
        let mut frontier = Self::default();
        frontier.push(root);
        frontier
    }

    /// Queues `url` unless it was already visited or reached; returns whether it was added
    pub fn push(&mut self, url: Url) -> bool {
        if self.is_visited(&url) {
            return false;
        }
        self.to_visit.insert(url)
    }

    /// Takes the next pending URL
    pub fn pop(&mut self) -> Option<Url> {
        self.to_visit.pop_first()
    }

    /// Records `url` as visited; returns false if it already was
    pub fn mark_visited(&mut self, url: Url) -> bool {
        self.to_visit.remove(&url);
        self.visited.insert(url)
    }

    /// Records the URL a redirect landed on
    ///
    /// Returns false when that page was already visited or reached through
    /// another redirect, in which case its content has been seen.
    pub fn record_redirect(&mut self, final_url: Url) -> bool {
        if self.is_visited(&final_url) {
            return false;
        }
        self.to_visit.remove(&final_url);
        self.aliases.insert(final_url)
    }

    /// True for visited URLs and for redirect targets
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url) || self.aliases.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_disjoint(&self) -> bool {
        self.to_visit.is_disjoint(&self.visited) && self.to_visit.is_disjoint(&self.aliases)
    }

    pub fn into_visited(self) -> BTreeSet<Url> {
        self.visited
    }
}
