//! WHOIS registrant lookup over TCP port 43
//!
//! The IANA server names the registry responsible for a TLD; thin registries
//! in turn point at the registrar's server, which holds the contact data.

use crate::attribution::SignalSource;
use crate::WhoseError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const WHOIS_PORT: u16 = 43;
pub const IANA_SERVER: &str = "whois.iana.org";

/// Reported when the registry answers but withholds the registrant
pub const REDACTED: &str = "WHOIS Data: Redacted";

/// Reported when no answer could be obtained
pub const UNAVAILABLE: &str = "WHOIS Data: Unavailable";

/// Referral hops followed after the IANA query
const MAX_REFERRALS: usize = 2;

/// Responses larger than this are truncated
const MAX_RESPONSE_BYTES: u64 = 256 * 1024;

const REFERRAL_KEYS: &[&str] = &["refer", "whois", "registrar whois server"];

const NAME_KEYS: &[&str] = &["registrant name", "registrant", "person", "owner"];

const ORG_KEYS: &[&str] = &[
    "registrant organization",
    "registrant organisation",
    "org-name",
    "organization",
    "org",
];

const REDACTION_MARKERS: &[&str] = &[
    "redacted",
    "privacy",
    "not disclosed",
    "withheld",
    "data protected",
    "gdpr masked",
    "statutory masking",
];

/// Registrant lookup through the WHOIS protocol
#[derive(Debug, Clone)]
pub struct WhoisSource {
    root_server: String,
    port: u16,
    timeout: Duration,
}

impl Default for WhoisSource {
    fn default() -> Self {
        Self::new(IANA_SERVER, WHOIS_PORT, Duration::from_secs(10))
    }
}

impl WhoisSource {
    pub fn new(root_server: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            root_server: root_server.into(),
            port,
            timeout,
        }
    }

    async fn query(&self, server: &str, domain: &str) -> Result<String, WhoseError> {
        let failure = |message: String| WhoseError::Whois {
            domain: domain.to_string(),
            message: format!("{}: {}", server, message),
        };

        let exchange = async {
            let mut stream = TcpStream::connect((server, self.port)).await?;
            stream.write_all(format!("{}\r\n", domain).as_bytes()).await?;

            let mut response = Vec::new();
            (&mut stream)
                .take(MAX_RESPONSE_BYTES)
                .read_to_end(&mut response)
                .await?;
            Ok::<_, std::io::Error>(response)
        };

        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| failure(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| failure(e.to_string()))?;

        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}

#[async_trait]
impl SignalSource for WhoisSource {
    fn name(&self) -> &'static str {
        "whois"
    }

    async fn lookup(&self, domain: &str) -> Result<String, WhoseError> {
        let mut server = self.root_server.clone();
        let mut response = self.query(&server, domain).await?;

        for _ in 0..MAX_REFERRALS {
            if let Some(registrant) = parse_registrant(&response) {
                return Ok(registrant);
            }
            match parse_referral(&response) {
                Some(next) if !next.eq_ignore_ascii_case(&server) => {
                    tracing::debug!("WHOIS referral for {}: {} -> {}", domain, server, next);
                    response = self.query(&next, domain).await?;
                    server = next;
                }
                _ => break,
            }
        }

        Ok(parse_registrant(&response).unwrap_or_else(|| REDACTED.to_string()))
    }

    fn unavailable(&self) -> String {
        UNAVAILABLE.to_string()
    }
}

/// Splits a `key: value` line, lowercasing the key
fn field(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let value = value.trim();
    (!value.is_empty()).then(|| (key.trim().to_ascii_lowercase(), value))
}

/// Finds the next server to ask
pub fn parse_referral(response: &str) -> Option<String> {
    response
        .lines()
        .filter_map(field)
        .find(|(key, _)| REFERRAL_KEYS.contains(&key.as_str()))
        .map(|(_, value)| {
            value
                .trim_start_matches("whois://")
                .trim_start_matches("rwhois://")
                .trim_end_matches('/')
                .to_ascii_lowercase()
        })
        .filter(|server| !server.is_empty() && !server.contains(' '))
}

/// Extracts the registrant name, falling back to the organization
///
/// Returns `None` when neither is present or both are redacted.
pub fn parse_registrant(response: &str) -> Option<String> {
    let fields: Vec<(String, &str)> = response
        .lines()
        .filter(|line| !line.trim_start().starts_with(['%', '#', '>']))
        .filter_map(field)
        .collect();

    let lookup = |keys: &[&str]| {
        keys.iter().find_map(|wanted| {
            fields
                .iter()
                .find(|(key, value)| key == wanted && !is_redacted(value))
                .map(|(_, value)| value.to_string())
        })
    };

    lookup(NAME_KEYS).or_else(|| lookup(ORG_KEYS))
}

fn is_redacted(value: &str) -> bool {
    let lowered = value.to_lowercase();
    REDACTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
