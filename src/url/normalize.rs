use crate::UrlError;
use url::Url;

/// Tracking query parameters removed so the same page is not queued twice
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Normalizes a crawl root given as a hostname or URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Default the scheme to `https://` when none is present
/// 3. Parse; only HTTP and HTTPS are accepted
/// 4. Require a host (lowercased by the parser)
/// 5. Apply [`normalize_link`]
///
/// # Examples
///
/// ```
/// use whose_domain::url::normalize_root;
///
/// let url = normalize_root("Example.COM").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
///
/// let url = normalize_root("http://example.com/about#team").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/about");
/// ```
pub fn normalize_root(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Parse("empty root".to_string()));
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    Ok(normalize_link(url))
}

/// Canonicalizes a resolved link for frontier membership
///
/// Drops the fragment and tracking query parameters, and removes an empty
/// query string. The path is left untouched: `/team` and `/team/` may be
/// different resources.
pub fn normalize_link(mut url: Url) -> Url {
    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
