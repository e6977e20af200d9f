//! Domain ownership attribution
//!
//! Combines the names found on a site with external ownership signals. Each
//! signal is best effort: a failing source is reported as unavailable and never
//! fails the report.

mod certificate;
mod whois;

pub use certificate::{default_roots, parse_subject, CertificateSource, CertificateSubject};
pub use whois::{parse_referral, parse_registrant, WhoisSource, REDACTED, UNAVAILABLE};

use crate::crawler::{CrawlReport, Crawler};
use crate::url::registrable_domain;
use crate::WhoseError;
use async_trait::async_trait;
use tracing::Instrument;

/// External ownership evidence for a domain (registry data, certificates)
#[async_trait]
pub trait SignalSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, domain: &str) -> Result<String, WhoseError>;

    /// Value reported when `lookup` fails
    fn unavailable(&self) -> String {
        format!("{}: unavailable", self.name())
    }
}

/// One answered signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub source: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct AttributionReport {
    /// Domain the signals were queried for
    pub domain: String,
    pub crawl: CrawlReport,
    pub signals: Vec<Signal>,
}

/// Crawls `domain`, then queries every signal source in order
pub async fn attribute(
    crawler: &Crawler,
    sources: &[Box<dyn SignalSource>],
    domain: &str,
    max_pages: usize,
) -> AttributionReport {
    let crawl = crawler.crawl(domain, max_pages).await;

    let domain = crawl
        .root
        .as_ref()
        .and_then(registrable_domain)
        .unwrap_or_else(|| domain.trim().to_lowercase());

    let mut signals = Vec::with_capacity(sources.len());
    for source in sources {
        let span = tracing::info_span!("signal", source = source.name(), domain = %domain);
        let value = match source.lookup(&domain).instrument(span).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("{}", e);
                source.unavailable()
            }
        };
        signals.push(Signal {
            source: source.name(),
            value,
        });
    }

    AttributionReport {
        domain,
        crawl,
        signals,
    }
}
