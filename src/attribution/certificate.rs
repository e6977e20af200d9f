//! TLS certificate subject lookup
//!
//! Connects to the domain on port 443, completes a verified handshake and
//! reports the identity fields of the leaf certificate's subject. Organization
//! validated certificates name the owning company; domain validated ones only
//! carry the host name.

use crate::attribution::SignalSource;
use crate::WhoseError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName};
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

pub const HTTPS_PORT: u16 = 443;

/// Identity fields of a certificate subject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateSubject {
    pub common_name: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
}

impl CertificateSubject {
    fn fields(&self) -> [(&'static str, &Option<String>); 6] {
        [
            ("CN", &self.common_name),
            ("O", &self.organization),
            ("OU", &self.organizational_unit),
            ("C", &self.country),
            ("ST", &self.state),
            ("L", &self.locality),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }
}

impl fmt::Display for CertificateSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no subject fields");
        }

        let present: Vec<String> = self
            .fields()
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|value| format!("{}={}", key, value)))
            .collect();
        write!(f, "{}", present.join(", "))
    }
}

/// Reads the subject of a DER encoded certificate
pub fn parse_subject(der: &[u8]) -> Result<CertificateSubject, X509Error> {
    let (_, cert) = parse_x509_certificate(der).map_err(|e| match e {
        x509_parser::nom::Err::Error(e) | x509_parser::nom::Err::Failure(e) => e,
        x509_parser::nom::Err::Incomplete(_) => X509Error::InvalidCertificate,
    })?;
    let subject = cert.subject();

    fn first<'b, 'a: 'b>(
        mut values: impl Iterator<Item = &'b AttributeTypeAndValue<'a>>,
    ) -> Option<String> {
        values
            .find_map(|value| value.as_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    Ok(CertificateSubject {
        common_name: first(subject.iter_common_name()),
        organization: first(subject.iter_organization()),
        organizational_unit: first(subject.iter_organizational_unit()),
        country: first(subject.iter_country()),
        state: first(subject.iter_state_or_province()),
        locality: first(subject.iter_locality()),
    })
}

/// Root store with the Mozilla trust anchors
pub fn default_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));
    roots
}

/// Certificate subject lookup over a verified TLS handshake
#[derive(Clone)]
pub struct CertificateSource {
    port: u16,
    timeout: Duration,
    config: Arc<ClientConfig>,
}

impl fmt::Debug for CertificateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateSource")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for CertificateSource {
    fn default() -> Self {
        Self::new(HTTPS_PORT, Duration::from_secs(10))
    }
}

impl CertificateSource {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            config: Arc::new(client_config(default_roots())),
        }
    }

    /// Trusts `roots` instead of the built-in anchors
    pub fn with_roots(mut self, roots: RootCertStore) -> Self {
        self.config = Arc::new(client_config(roots));
        self
    }

    /// Fetches the DER encoded leaf certificate presented by `domain`
    pub async fn fetch_leaf(&self, domain: &str) -> Result<Vec<u8>, WhoseError> {
        let failure = |message: String| WhoseError::Certificate {
            domain: domain.to_string(),
            message,
        };

        let server_name =
            ServerName::try_from(domain).map_err(|e| failure(format!("invalid name: {}", e)))?;
        let connector = TlsConnector::from(self.config.clone());

        let handshake = async {
            let stream = TcpStream::connect((domain, self.port)).await?;
            connector.connect(server_name, stream).await
        };

        let tls = tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| failure(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| failure(e.to_string()))?;

        let (_, connection) = tls.get_ref();
        connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .map(|leaf| leaf.0.clone())
            .ok_or_else(|| failure("no certificate presented".to_string()))
    }
}

fn client_config(roots: RootCertStore) -> ClientConfig {
    ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

#[async_trait]
impl SignalSource for CertificateSource {
    fn name(&self) -> &'static str {
        "certificate"
    }

    async fn lookup(&self, domain: &str) -> Result<String, WhoseError> {
        let der = self.fetch_leaf(domain).await?;
        let subject = parse_subject(&der).map_err(|e| WhoseError::Certificate {
            domain: domain.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("Certificate subject for {}: {}", domain, subject);
        Ok(subject.to_string())
    }
}
