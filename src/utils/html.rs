// src/utils/html.rs

//! HTML sanitizing and link discovery.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::url::{is_within_domain, normalize_link};

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<meta\b[^>]*>").unwrap());
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], area[href]").unwrap());

/// Strip scripts, styles, comments and meta tags from raw HTML.
pub fn clean_html(raw: &str) -> String {
    let html = COMMENT_RE.replace_all(raw, "");
    let html = SCRIPT_RE.replace_all(&html, "");
    let html = STYLE_RE.replace_all(&html, "");
    META_RE.replace_all(&html, "").into_owned()
}

/// Concatenated text nodes of a document.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect()
}

/// Links on a page that stay within `domain`, resolved against `page_url`.
///
/// Order of first appearance is kept; duplicates are dropped.
pub fn extract_links(html: &str, page_url: &Url, domain: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&LINK_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| normalize_link(page_url, href))
        .filter(|url| is_within_domain(url, domain))
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_noise() {
        let raw = r#"<html><head><meta charset="utf-8"><style>p { color: red }</style>
            <SCRIPT type="text/javascript">var x = "<p>";</SCRIPT></head>
            <body><!-- nav --><p>खबर</p></body></html>"#;
        let clean = clean_html(raw);

        assert!(!clean.contains("<meta"));
        assert!(!clean.contains("color: red"));
        assert!(!clean.contains("var x"));
        assert!(!clean.contains("nav"));
        assert!(clean.contains("<p>खबर</p>"));
    }

    #[test]
    fn test_visible_text() {
        let text = visible_text("<html><body><h1>शीर्षक</h1><p>a <b>b</b></p></body></html>");
        assert_eq!(text, "शीर्षकa b");
    }

    #[test]
    fn test_extract_links_restricted_to_domain() {
        let page = Url::parse("https://example.in/news/").unwrap();
        let html = r##"
            <a href="story-1">one</a>
            <a href="/story-2#comments">two</a>
            <a href="https://cdn.example.in/x">sub</a>
            <a href="https://other.com/y">offsite</a>
            <a href="mailto:desk@example.in">mail</a>
            <a href="story-1">dup</a>
        "##;

        let links = extract_links(html, &page, "example.in");
        assert_eq!(
            links,
            vec![
                "https://example.in/news/story-1",
                "https://example.in/story-2",
                "https://cdn.example.in/x",
            ]
        );
    }
}
