//! Site crawling
//!
//! - `fetcher`: the escalating fetch ladder (direct, bypass, render)
//! - `transport` / `renderer`: the network backends behind the ladder
//! - `headers`: randomized browser header sets
//! - `frontier` / `parser`: crawl bookkeeping and link discovery
//! - `coordinator`: the crawl loop producing a [`CrawlReport`]

mod coordinator;
mod fetcher;
mod frontier;
mod headers;
mod parser;
mod renderer;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{CrawlReport, Crawler, PageRecord};
pub use fetcher::{classify, FetchLadder, FetchResult, FetchedPage, LadderState, RetryPolicy};
pub use frontier::Frontier;
pub use headers::{
    BrowserHeaders, FixedPool, HeaderRotation, HeaderSource, RotatingAgents,
    FALLBACK_USER_AGENTS, REFERERS,
};
pub use parser::{parse_html, LinkSet, ParsedPage};
pub use renderer::{ChromiumRenderer, PageRenderer, RenderedPage};
pub use transport::{
    build_http_client, bypass_transport, BypassClient, DirectClient, FetchRequest,
    PageTransport, Tier, TransportResponse,
};

#[cfg(feature = "impersonate")]
pub use transport::ImpersonatingClient;
