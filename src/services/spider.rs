// src/services/spider.rs

//! Per-source crawl job.
//!
//! A spider owns the crawl decisions for one source: what to seed, what to
//! store for each fetched page, and which discovered links to follow. The
//! fetch loop itself lives in the engine.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{AppError, Result};
use crate::language::ScriptClassifier;
use crate::models::{HtmlRecord, PageCounters, Source};
use crate::services::fetcher::FetchedPage;
use crate::services::frontier::Frontier;
use crate::storage::CorpusStore;
use crate::utils::html::{clean_html, extract_links, visible_text};
use crate::utils::url::allowed_domain;

/// Crawl variant of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiderKind {
    /// Fetch a fixed list of URLs; never follow links.
    Sitemap { seeds: Vec<String> },
    /// Start at the home page and follow in-domain links of native pages.
    Recursive { home_url: String },
}

impl SpiderKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sitemap { .. } => "sitemap",
            Self::Recursive { .. } => "recursive",
        }
    }
}

/// Lifecycle of a crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One crawl job bound to a source.
pub struct Spider {
    source: Source,
    kind: SpiderKind,
    classifier: ScriptClassifier,
    allowed_domain: String,
    native_gate_threshold: usize,
    store: Arc<dyn CorpusStore>,
    counters: Arc<PageCounters>,
    state: JobState,
}

impl Spider {
    /// Create a job for a source.
    ///
    /// Fails when the source's language has no known script or its home URL
    /// has no host.
    pub fn new(
        source: Source,
        kind: SpiderKind,
        native_gate_threshold: usize,
        store: Arc<dyn CorpusStore>,
        counters: Arc<PageCounters>,
    ) -> Result<Self> {
        let classifier = ScriptClassifier::for_language(&source.language_code)
            .ok_or_else(|| AppError::UnsupportedLanguage(source.language_code.clone()))?;
        let allowed_domain = allowed_domain(&source.home_url).ok_or_else(|| {
            AppError::validation(format!("No host in home URL: {}", source.home_url))
        })?;

        Ok(Self {
            source,
            kind,
            classifier,
            allowed_domain,
            native_gate_threshold,
            store,
            counters,
            state: JobState::Init,
        })
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn kind(&self) -> &SpiderKind {
        &self.kind
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn pages_crawled(&self) -> u64 {
        self.counters.pages_crawled()
    }

    fn transition(&mut self, from: JobState, to: JobState) -> Result<()> {
        if self.state != from {
            return Err(AppError::validation(format!(
                "Job {} cannot move from {} to {}",
                self.source.name, self.state, to
            )));
        }
        self.state = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(JobState::Init, JobState::Running)
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(JobState::Running, JobState::Completed)
    }

    /// Mark the job failed. Allowed from `Init` (setup failed) or `Running`.
    pub fn fail(&mut self) -> Result<()> {
        match self.state {
            JobState::Init | JobState::Running => {
                self.state = JobState::Failed;
                Ok(())
            }
            state => Err(AppError::validation(format!(
                "Job {} cannot move from {} to failed",
                self.source.name, state
            ))),
        }
    }

    /// Queue the initial requests.
    pub fn seed(&self, frontier: &mut Frontier) {
        match &self.kind {
            SpiderKind::Sitemap { seeds } => {
                let added = seeds.iter().filter(|url| frontier.push(url.as_str(), 0)).count();
                log::debug!(
                    "{}: {} of {} sitemap URLs are new",
                    self.source.name,
                    added,
                    seeds.len()
                );
            }
            SpiderKind::Recursive { home_url } => frontier.push_seed(home_url.as_str()),
        }
    }

    /// Number of characters of a page's visible text in the job's script.
    pub fn native_char_count(&self, clean: &str) -> usize {
        self.classifier.count(&visible_text(clean))
    }

    /// Handle a fetched page: store it and return the links to follow.
    pub async fn parse(&self, page: &FetchedPage) -> Result<Vec<String>> {
        if !page.is_html() {
            return Err(AppError::crawl(
                &page.url,
                format!(
                    "not an HTML page ({})",
                    page.content_type.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        let clean = clean_html(&page.body);
        let links = match &self.kind {
            SpiderKind::Sitemap { .. } => Vec::new(),
            SpiderKind::Recursive { .. } => self.follow_links(&clean, page)?,
        };

        let record = HtmlRecord::new(clean, &self.source.name, &page.url);
        let payload = serde_json::to_string(&record)?;
        self.store.add(&self.source.name, &page.url, &payload).await?;
        self.counters.record_page();

        Ok(links)
    }

    fn follow_links(&self, clean: &str, page: &FetchedPage) -> Result<Vec<String>> {
        let native = self.native_char_count(clean);
        if native < self.native_gate_threshold {
            log::debug!(
                "{}: not following links of {} ({} native chars)",
                self.source.name,
                page.url,
                native
            );
            return Ok(Vec::new());
        }

        let base = Url::parse(&page.final_url)?;
        Ok(extract_links(clean, &base, &self.allowed_domain))
    }
}
