use url::{Host, Url};

/// Computes the registrable domain of a URL
///
/// The boundary comes from the Public Suffix List, private section included,
/// so `www.example.com` and `blog.example.com` both give `example.com`,
/// `shop.example.co.uk` gives `example.co.uk`, and each `*.github.io` site is
/// its own domain. IP addresses, single-label hosts and hosts that are
/// themselves a public suffix are returned unchanged.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use whose_domain::url::registrable_domain;
///
/// let url = Url::parse("https://www.example.com/").unwrap();
/// assert_eq!(registrable_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://alice.github.io/").unwrap();
/// assert_eq!(registrable_domain(&url), Some("alice.github.io".to_string()));
/// ```
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
        Host::Domain(domain) => registrable_from_host(domain),
    }
}

fn registrable_from_host(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        return None;
    }

    match psl::domain_str(&host) {
        Some(domain) => Some(domain.to_string()),
        None => Some(host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(url: &str) -> Option<String> {
        registrable_domain(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_plain_domain() {
        assert_eq!(reg("https://example.com/"), Some("example.com".to_string()));
        assert_eq!(reg("https://example.com:8080/"), Some("example.com".to_string()));
    }

    #[test]
    fn test_subdomains_collapse() {
        assert_eq!(reg("https://www.example.com/"), Some("example.com".to_string()));
        assert_eq!(
            reg("https://api.v2.example.com/endpoint"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_country_code_second_level() {
        assert_eq!(
            reg("https://shop.example.co.uk/"),
            Some("example.co.uk".to_string())
        );
        assert_eq!(
            reg("https://www.example.com.au/"),
            Some("example.com.au".to_string())
        );
    }

    #[test]
    fn test_hosted_sites_are_separate_domains() {
        assert_eq!(
            reg("https://alice.github.io/"),
            Some("alice.github.io".to_string())
        );
        assert_ne!(reg("https://alice.github.io/"), reg("https://mallory.github.io/"));
        assert_eq!(
            reg("https://www.kestrel.netlify.app/about"),
            Some("kestrel.netlify.app".to_string())
        );
        assert_ne!(
            reg("https://jane.blogspot.com/"),
            reg("https://john.blogspot.com/")
        );
    }

    #[test]
    fn test_suffix_and_single_label_unchanged() {
        assert_eq!(reg("https://github.io/"), Some("github.io".to_string()));
        assert_eq!(reg("http://localhost:3000/"), Some("localhost".to_string()));
    }

    #[test]
    fn test_ip_hosts_unchanged() {
        assert_eq!(reg("http://127.0.0.1:8080/"), Some("127.0.0.1".to_string()));
    }
}
