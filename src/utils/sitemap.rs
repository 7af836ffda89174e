// src/utils/sitemap.rs

//! Sitemap XML parsing.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    /// `<urlset>`: page URLs
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: URLs of further sitemaps
    Index(Vec<String>),
}

impl Sitemap {
    pub fn urls(&self) -> &[String] {
        match self {
            Sitemap::UrlSet(urls) | Sitemap::Index(urls) => urls,
        }
    }
}

/// Parse a sitemap or sitemap index, collecting every `<loc>` value.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut is_index = false;
    let mut in_loc = false;
    let mut urls = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemapindex" => is_index = true,
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            }
            Event::Text(t) if in_loc => {
                let loc = t.unescape()?;
                let loc = loc.trim();
                if !loc.is_empty() {
                    urls.push(loc.to_string());
                }
            }
            Event::CData(c) if in_loc => {
                let loc = String::from_utf8_lossy(&c).trim().to_string();
                if !loc.is_empty() {
                    urls.push(loc);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(if is_index {
        Sitemap::Index(urls)
    } else {
        Sitemap::UrlSet(urls)
    })
}
