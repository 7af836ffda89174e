// src/services/engine.rs

//! Fetch engine driving crawl jobs.
//!
//! The engine pops requests from a job's frontier, fetches them with bounded
//! concurrency and retries, hands the responses to the spider and queues the
//! links it returns. All jobs share one request budget.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::services::fetcher::{FetchedPage, Fetcher};
use crate::services::frontier::{Frontier, FrontierEntry};
use crate::services::spider::{JobState, Spider};

/// Base delay between retries; attempt `n` waits `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Why a job stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Frontier exhausted
    Finished,
    /// Per-pass page budget reached; the rest stays queued
    PageBudget,
    Failed(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => f.write_str("finished"),
            Self::PageBudget => f.write_str("budget"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Result of one job run.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub source: String,
    pub state: JobState,
    pub pages_crawled: u64,
    pub reason: CloseReason,
}

impl JobOutcome {
    /// Outcome of a job that failed before it could run.
    pub fn failed(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            source: source.into(),
            state: JobState::Failed,
            pages_crawled: 0,
            reason: CloseReason::Failed(message.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == JobState::Failed
    }
}

/// Shared fetch engine.
pub struct CrawlEngine {
    fetcher: Arc<dyn Fetcher>,
    settings: CrawlerConfig,
    budget: Arc<Semaphore>,
}

impl CrawlEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: CrawlerConfig) -> Self {
        let budget = Arc::new(Semaphore::new(settings.concurrent_requests.max(1)));
        Self {
            fetcher,
            settings,
            budget,
        }
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// Run a job to a terminal state.
    ///
    /// Only unrecoverable conditions fail the job: an unresolvable domain or
    /// an unusable job directory. Page-level errors are logged and skipped.
    pub async fn run(&self, spider: &mut Spider, job_dir: &Path) -> JobOutcome {
        if let Err(e) = spider.start() {
            return JobOutcome::failed(spider.name(), e);
        }

        log::info!(
            "Starting {} crawl of {} ({})",
            spider.kind().label(),
            spider.name(),
            spider.allowed_domain()
        );

        let reason = match self.crawl(spider, job_dir).await {
            Ok(reason) => {
                // Running -> Completed cannot fail here
                let _ = spider.complete();
                reason
            }
            Err(e) => {
                log::error!("{}", e);
                let _ = spider.fail();
                CloseReason::Failed(e.to_string())
            }
        };

        log::info!(
            "Closing {} ({}): {} page(s) crawled",
            spider.name(),
            reason,
            spider.pages_crawled()
        );

        JobOutcome {
            source: spider.name().to_string(),
            state: spider.state(),
            pages_crawled: spider.pages_crawled(),
            reason,
        }
    }

    async fn crawl(&self, spider: &Spider, job_dir: &Path) -> Result<CloseReason> {
        let name = spider.name();

        tokio::fs::create_dir_all(job_dir).await.map_err(|e| {
            AppError::job_failed(
                name,
                format!("cannot create job directory {}: {e}", job_dir.display()),
            )
        })?;

        self.fetcher
            .resolve(spider.allowed_domain())
            .await
            .map_err(|e| AppError::job_failed(name, e))?;

        let mut frontier = Frontier::open(job_dir, spider.source().overrides.dedupe)
            .await
            .map_err(|e| AppError::job_failed(name, e))?;
        spider.seed(&mut frontier);

        let per_job = self.settings.concurrent_requests_per_domain.max(1);
        let flush_every = self.settings.frontier_flush_every.max(1);
        let max_pages = self.settings.max_pages_per_pass;
        let delay = self.settings.download_delay();

        let mut in_flight = FuturesUnordered::new();
        let mut in_flight_entries: HashMap<u64, FrontierEntry> = HashMap::new();
        let mut dispatched: u64 = 0;
        let mut completed: usize = 0;
        let mut reason = CloseReason::Finished;

        loop {
            while in_flight.len() < per_job && !frontier.is_empty() {
                if max_pages > 0 && dispatched >= max_pages {
                    reason = CloseReason::PageBudget;
                    break;
                }
                let Some(entry) = frontier.pop() else { break };

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let id = dispatched;
                dispatched += 1;
                let url = entry.url.clone();
                in_flight_entries.insert(id, entry);
                in_flight.push(async move { (id, self.fetch_with_retry(&url).await) });
            }

            let Some((id, result)) = in_flight.next().await else {
                break;
            };
            let Some(entry) = in_flight_entries.remove(&id) else {
                continue;
            };

            match result {
                Ok(page) => match spider.parse(&page).await {
                    Ok(links) => self.enqueue(&mut frontier, &entry, links),
                    Err(e) => log::warn!("{}: skipping {}: {}", name, entry.url, e),
                },
                Err(e) => log::warn!("{}: failed to fetch {}: {}", name, entry.url, e),
            }

            completed += 1;
            if completed % flush_every == 0 {
                frontier
                    .save(in_flight_entries.values())
                    .await
                    .map_err(|e| AppError::job_failed(name, e))?;
            }
        }

        frontier
            .save(std::iter::empty::<&FrontierEntry>())
            .await
            .map_err(|e| AppError::job_failed(name, e))?;

        log::debug!(
            "{}: {} request(s) left pending, {} URL(s) seen",
            name,
            frontier.pending_len(),
            frontier.seen_len()
        );

        Ok(reason)
    }

    fn enqueue(&self, frontier: &mut Frontier, parent: &FrontierEntry, links: Vec<String>) {
        let max_depth = self.settings.max_depth;
        if max_depth > 0 && parent.depth >= max_depth {
            return;
        }
        for link in links {
            frontier.push(link, parent.depth + 1);
        }
    }

    /// Fetch a URL under the shared budget, retrying transient failures.
    async fn fetch_with_retry(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt = 0;
        loop {
            let result = {
                let _permit = self
                    .budget
                    .acquire()
                    .await
                    .map_err(|e| AppError::crawl(url, e))?;
                self.fetcher.fetch(url).await
            };

            match result {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.settings.retry_times && is_retryable(&e) => {
                    attempt += 1;
                    log::debug!("Retrying {} (attempt {}): {}", url, attempt, e);
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Client errors other than timeouts and throttling will not change on retry.
fn is_retryable(error: &AppError) -> bool {
    match error {
        AppError::Http(e) => match e.status() {
            Some(status) => {
                !status.is_client_error() || status.as_u16() == 408 || status.as_u16() == 429
            }
            None => true,
        },
        _ => true,
    }
}
