//! Whose-Domain main entry point
//!
//! Command-line interface for crawling a site and reporting who appears to
//! own it.

use anyhow::Context;
use clap::Parser;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::PathBuf;
use whose_domain::attribution::{attribute, CertificateSource, SignalSource, WhoisSource};
use whose_domain::config::{load_config_or_default, Config};
use whose_domain::text;
use whose_domain::{CrawlReport, Crawler, NameExtractor, NameValidator};
use tracing_subscriber::EnvFilter;

/// Whose-Domain: find the people behind a website
///
/// Crawls a site with escalating fetch strategies, extracts person names from
/// the page text, and optionally reads the TLS certificate subject and asks
/// WHOIS for the registrant.
#[derive(Parser, Debug)]
#[command(name = "whose-domain")]
#[command(version = "1.0.0")]
#[command(about = "Find the people behind a website", long_about = None)]
struct Cli {
    /// Domain or URL to crawl; a path with --file, literal text with --text
    #[arg(value_name = "INPUT")]
    input: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Never fall back to a headless browser
    #[arg(long)]
    no_render: bool,

    /// Also report the subject of the site's TLS certificate
    #[arg(long, conflicts_with_all = ["file", "text"])]
    tls: bool,

    /// Also query WHOIS for the registrant
    #[arg(long, conflicts_with_all = ["file", "text"])]
    whois: bool,

    /// Treat INPUT as a local HTML or text file
    #[arg(long, conflicts_with = "text")]
    file: bool,

    /// Treat INPUT as literal text ("-" reads stdin)
    #[arg(long, conflicts_with = "file")]
    text: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_config_or_default(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to build default configuration".to_string(),
        }
    })?;

    if cli.no_render {
        config.render.enabled = false;
    }

    if cli.file {
        let content = std::fs::read_to_string(&cli.input)
            .with_context(|| format!("Failed to read {}", cli.input))?;
        handle_offline(&config, &content)
    } else if cli.text {
        let content = if cli.input == "-" {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        } else {
            cli.input.clone()
        };
        handle_offline(&config, &content)
    } else {
        let mut sources: Vec<Box<dyn SignalSource>> = Vec::new();
        if cli.tls {
            sources.push(Box::new(CertificateSource::default()));
        }
        if cli.whois {
            sources.push(Box::new(WhoisSource::default()));
        }
        handle_crawl(&config, &cli.input, cli.max_pages, &sources).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("whose_domain=info,warn"),
            1 => EnvFilter::new("whose_domain=debug,info"),
            2 => EnvFilter::new("whose_domain=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs extraction and validation over local content without crawling
fn handle_offline(config: &Config, content: &str) -> anyhow::Result<()> {
    let normalized = if text::looks_like_markup(content) {
        text::normalize(content)
    } else {
        text::normalize_lines(content)
    };

    let extractor = NameExtractor::from_config(&config.extraction)?;
    let validator =
        NameValidator::new().with_extra_exclusions(config.extraction.extra_exclusions.iter().cloned());

    let candidates = extractor.extract_candidates(&normalized);
    tracing::debug!("{} candidates before validation", candidates.len());

    print_names(&validator.validate(candidates.texts()));
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    domain: &str,
    max_pages: Option<usize>,
    sources: &[Box<dyn SignalSource>],
) -> anyhow::Result<()> {
    let span = tracing::info_span!("whose_domain");
    let crawler = Crawler::new(config)
        .context("Failed to initialize crawler")?
        .with_span(span);
    let max_pages = max_pages.unwrap_or(crawler.max_pages());

    if !sources.is_empty() {
        let report = attribute(&crawler, sources, domain, max_pages).await;

        print_crawl(&report.crawl);
        println!("\nOwnership signals for {}:", report.domain);
        for signal in &report.signals {
            println!("  {}: {}", signal.source, signal.value);
        }
    } else {
        let report = crawler.crawl(domain, max_pages).await;
        print_crawl(&report);
    }

    Ok(())
}

fn print_names(names: &BTreeSet<String>) {
    println!("Found {} unique person names:", names.len());
    for name in names {
        println!("- {}", name);
    }
}

fn print_crawl(report: &CrawlReport) {
    print_names(&report.names);

    println!("\nVisited {} pages:", report.visited.len());
    for url in &report.visited {
        println!("  {}", url);
    }

    if !report.pages.is_empty() {
        println!("\nPages read ({}):", report.pages.len());
        for page in &report.pages {
            match &page.title {
                Some(title) => println!("  {} [{}] {}", page.final_url, page.tier, title),
                None => println!("  {} [{}]", page.final_url, page.tier),
            }
        }
    }

    if !report.external_links.is_empty() {
        println!("\nExternal links ({}):", report.external_links.len());
        for url in &report.external_links {
            println!("  {}", url);
        }
    }
}
