//! HTML parsing for link discovery
//!
//! Only `<a href>` anchors are followed. Resolved links are canonicalized the
//! same way as the crawl root so that frontier membership is stable.

use crate::url::{normalize_link, registrable_domain};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Followable links, absolute and without fragments
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts the title and anchor links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anchors anywhere in the document, `rel="nofollow"` included
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to http(s)
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was served from, after redirects
///
/// # Example
///
/// ```
/// use whose_domain::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page#top">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable anchors from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(normalize_link(absolute_url)),
        _ => None,
    }
}

/// Links discovered during a crawl, split by registrable domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    /// Same registrable domain as the crawl root
    pub internal: BTreeSet<Url>,
    pub external: BTreeSet<Url>,
}

impl LinkSet {
    /// Files one link under internal or external; returns true if internal
    pub fn insert(&mut self, root_domain: &str, link: Url) -> bool {
        let internal = registrable_domain(&link).as_deref() == Some(root_domain);
        if internal {
            self.internal.insert(link);
        } else {
            self.external.insert(link);
        }
        internal
    }

    pub fn is_disjoint(&self) -> bool {
        self.internal.is_disjoint(&self.external)
    }
}
