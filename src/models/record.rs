//! Records persisted in the corpus.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Timestamp format shared by all records.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M";

/// Current local time in record format.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A fetched page after sanitizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlRecord {
    pub html: String,

    /// Name of the source the page was fetched from
    #[serde(rename = "source")]
    pub source_name: String,

    pub url: String,
    pub timestamp: String,
}

impl HtmlRecord {
    pub fn new(html: String, source_name: &str, url: &str) -> Self {
        Self {
            html,
            source_name: source_name.to_string(),
            url: url.to_string(),
            timestamp: timestamp_now(),
        }
    }
}

/// Article text that passed the validity filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub body: String,

    #[serde(rename = "source")]
    pub source_name: String,

    pub url: String,

    /// Crawl time inherited from the HTML record
    pub timestamp: String,
}

impl ArticleRecord {
    pub fn from_html(record: &HtmlRecord, title: String, body: String) -> Self {
        Self {
            title,
            body,
            source_name: record.source_name.clone(),
            url: record.url.clone(),
            timestamp: record.timestamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_record_json_keys() {
        let record = HtmlRecord {
            html: "<p>नमस्ते</p>".to_string(),
            source_name: "example.in".to_string(),
            url: "https://example.in/a".to_string(),
            timestamp: "01/02/24 10:30".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains(r#""source":"example.in""#));
        // Non-ASCII text is stored as-is
        assert!(json.contains("नमस्ते"));
    }

    #[test]
    fn test_article_inherits_from_html() {
        let html = HtmlRecord::new("<p>x</p>".to_string(), "src", "https://src.com/1");
        let article = ArticleRecord::from_html(&html, "Title".into(), "Body".into());

        assert_eq!(article.source_name, "src");
        assert_eq!(article.url, html.url);
        assert_eq!(article.timestamp, html.timestamp);
    }
}
