// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Domain a job is allowed to crawl, derived from its home URL.
///
/// # Examples
/// ```
/// use webcorpus::utils::url::allowed_domain;
///
/// assert_eq!(
///     allowed_domain("https://News.Example.in:8080/home"),
///     Some("news.example.in".to_string())
/// );
/// ```
pub fn allowed_domain(home_url: &str) -> Option<String> {
    let parsed = Url::parse(home_url).ok()?;
    parsed.host_str().map(|host| host.to_lowercase())
}

/// Stable source name for a URL: its host without a leading `www.`.
pub fn source_name(url: &str) -> Option<String> {
    let domain = allowed_domain(url)?;
    Some(
        domain
            .strip_prefix("www.")
            .map(str::to_string)
            .unwrap_or(domain),
    )
}

/// Check whether a URL's host is the allowed domain or one of its subdomains.
pub fn is_within_domain(url: &Url, domain: &str) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            host == domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => false,
    }
}

/// Resolve a link found on a page into a crawlable absolute URL.
///
/// Non-HTTP schemes are dropped and fragments removed.
pub fn normalize_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_domain_is_deterministic() {
        let home = "https://www.Example.in/home?x=1";
        assert_eq!(allowed_domain(home), Some("www.example.in".to_string()));
        assert_eq!(allowed_domain(home), allowed_domain(home));
        assert_eq!(allowed_domain("invalid-url"), None);
    }

    #[test]
    fn test_source_name() {
        assert_eq!(
            source_name("https://www.dainik.in/"),
            Some("dainik.in".to_string())
        );
        assert_eq!(
            source_name("https://epaper.dainik.in/"),
            Some("epaper.dainik.in".to_string())
        );
    }

    #[test]
    fn test_is_within_domain() {
        let domain = "example.in";
        let url = |s: &str| Url::parse(s).unwrap();

        assert!(is_within_domain(&url("https://example.in/a"), domain));
        assert!(is_within_domain(&url("https://news.example.in/a"), domain));
        assert!(!is_within_domain(&url("https://badexample.in/a"), domain));
        assert!(!is_within_domain(&url("https://example.com/a"), domain));
    }

    #[test]
    fn test_normalize_link() {
        let base = Url::parse("https://example.in/path/page.html").unwrap();

        assert_eq!(
            normalize_link(&base, "other.html#top").map(|u| u.to_string()),
            Some("https://example.in/path/other.html".to_string())
        );
        assert_eq!(
            normalize_link(&base, "/root").map(|u| u.to_string()),
            Some("https://example.in/root".to_string())
        );
        assert!(normalize_link(&base, "mailto:someone@example.in").is_none());
        assert!(normalize_link(&base, "javascript:void(0)").is_none());
        assert!(normalize_link(&base, "#section").is_none());
    }
}
