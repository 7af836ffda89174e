// src/services/fetcher.rs

//! Page fetching and sitemap harvesting.

use std::collections::VecDeque;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::http::{create_async_client, is_html_content_type};
use crate::utils::sitemap::{Sitemap, parse_sitemap};

/// A fetched response body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// URL after redirects; links resolve against it
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    /// An HTML page whose final URL is the requested one.
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    pub fn is_html(&self) -> bool {
        is_html_content_type(self.content_type.as_deref())
    }
}

/// Network access used by crawl jobs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Check that a domain resolves. Failure makes the whole job unrecoverable.
    async fn resolve(&self, domain: &str) -> Result<()>;

    /// Fetch one URL.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn resolve(&self, domain: &str) -> Result<()> {
        let mut addrs = tokio::net::lookup_host((domain, 80))
            .await
            .map_err(|e| AppError::crawl(domain, format!("DNS lookup failed: {e}")))?;

        match addrs.next() {
            Some(_) => Ok(()),
            None => Err(AppError::crawl(domain, "DNS lookup returned no addresses")),
        }
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            content_type,
            body,
        })
    }
}

/// Collect page URLs from a sitemap, following sitemap indexes.
///
/// At most `max_children` nested sitemaps are fetched. A failing child
/// sitemap is skipped; a failing root sitemap is an error.
pub async fn harvest_sitemap(
    fetcher: &dyn Fetcher,
    sitemap_url: &str,
    max_children: usize,
) -> Result<Vec<String>> {
    let root = fetcher.fetch(sitemap_url).await?;
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut urls = Vec::new();

    match parse_sitemap(&root.body)? {
        Sitemap::UrlSet(pages) => urls.extend(pages),
        Sitemap::Index(children) => queue.extend(children),
    }

    let mut fetched_children = 0;
    while let Some(child) = queue.pop_front() {
        if fetched_children >= max_children {
            log::warn!(
                "Sitemap {} has more than {} child sitemaps; ignoring the rest",
                sitemap_url,
                max_children
            );
            break;
        }
        fetched_children += 1;

        let parsed = match fetcher.fetch(&child).await {
            Ok(page) => parse_sitemap(&page.body),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(Sitemap::UrlSet(pages)) => urls.extend(pages),
            Ok(Sitemap::Index(children)) => queue.extend(children),
            Err(e) => log::warn!("Skipping child sitemap {}: {}", child, e),
        }
    }

    Ok(urls)
}
