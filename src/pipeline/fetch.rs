// src/pipeline/fetch.rs

//! Batch crawl orchestration.
//!
//! One pass crawls every registered source of a language concurrently, then
//! checkpoints all job state. Passes repeat until the stop condition says so.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::{AppError, Result};
use crate::language::script_for;
use crate::models::{Config, CrawlMode, CrawlerConfig, PageCounters, Source, SourceRegistry};
use crate::services::checkpoint::create_checkpoint;
use crate::services::engine::{CrawlEngine, JobOutcome};
use crate::services::fetcher::{Fetcher, HttpFetcher, harvest_sitemap};
use crate::services::spider::{Spider, SpiderKind};
use crate::services::stats::StatsTicker;
use crate::storage::{CorpusStore, LocalCorpus};
use crate::utils::report;

/// Outcome of one pass over all sources.
#[derive(Debug, Clone)]
pub struct PassReport {
    /// 1-based pass number
    pub pass: usize,
    pub outcomes: Vec<JobOutcome>,
    pub checkpoint: PathBuf,
}

impl PassReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn pages(&self) -> u64 {
        self.outcomes.iter().map(|o| o.pages_crawled).sum()
    }
}

/// Runs crawl passes for one language.
pub struct Orchestrator {
    config: Arc<Config>,
    lang: String,
    registry: SourceRegistry,
    engine: Arc<CrawlEngine>,
    html_store: Arc<dyn CorpusStore>,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, lang: &str, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        if script_for(lang).is_none() {
            return Err(AppError::UnsupportedLanguage(lang.to_string()));
        }

        let registry = SourceRegistry::new(&config.paths.sources_dir);
        let engine = Arc::new(CrawlEngine::new(fetcher, config.crawler.clone()));
        let html_store: Arc<dyn CorpusStore> = Arc::new(LocalCorpus::new(config.html_dir(lang)));

        Ok(Self {
            config,
            lang: lang.to_string(),
            registry,
            engine,
            html_store,
        })
    }

    /// Store fetched pages somewhere other than the configured corpus.
    pub fn with_store(mut self, store: Arc<dyn CorpusStore>) -> Self {
        self.html_store = store;
        self
    }

    /// Run passes until `should_stop` returns true. Returns the number of
    /// passes run.
    ///
    /// A checkpoint failure ends the loop with an error.
    pub async fn run(&self, mut should_stop: impl FnMut(&PassReport) -> bool) -> Result<usize> {
        let mut pass = 0;
        loop {
            pass += 1;
            let report = self.run_pass(pass).await?;
            if should_stop(&report) {
                return Ok(pass);
            }
        }
    }

    /// Crawl every source once, then checkpoint.
    pub async fn run_pass(&self, pass: usize) -> Result<PassReport> {
        report::header(&format!("Pass {} for language '{}'", pass, self.lang));

        let sources = self.registry.load(&self.lang)?;
        if sources.is_empty() {
            log::warn!("No sources registered for '{}'", self.lang);
        }

        let lang_root = self.config.jobdir_lang_root(&self.lang);
        tokio::fs::create_dir_all(&lang_root).await?;

        report::step(1, 2, &format!("Crawling {} source(s)", sources.len()));
        let mut jobs = JoinSet::new();
        for source in sources {
            jobs.spawn(run_job(
                Arc::clone(&self.config),
                self.lang.clone(),
                Arc::clone(&self.engine),
                Arc::clone(&self.html_store),
                source,
            ));
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => log::error!("Crawl task aborted: {}", e),
            }
        }
        outcomes.sort_by(|a, b| a.source.cmp(&b.source));

        report::step(2, 2, "Checkpointing job state");
        let checkpoint = create_checkpoint(&self.config.paths.jobdir_root, &self.lang).await?;

        let pass_report = PassReport {
            pass,
            outcomes,
            checkpoint,
        };
        log_pass(&pass_report);
        Ok(pass_report)
    }
}

/// Crawl the sources of a language over HTTP.
///
/// Runs `passes` passes, or forever when `None`.
pub async fn run_fetch(config: Arc<Config>, lang: &str, passes: Option<usize>) -> Result<usize> {
    let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
    let orchestrator = Orchestrator::new(config, lang, fetcher)?;
    orchestrator
        .run(|report| passes.is_some_and(|n| report.pass >= n))
        .await
}

async fn run_job(
    config: Arc<Config>,
    lang: String,
    engine: Arc<CrawlEngine>,
    store: Arc<dyn CorpusStore>,
    source: Source,
) -> JobOutcome {
    let name = source.name.clone();
    let job_dir = config.jobdir_lang_root(&lang).join(&name);
    let kind = choose_kind(engine.fetcher().as_ref(), &config.crawler, &source).await;

    let counters = Arc::new(PageCounters::new());
    let mut spider = match Spider::new(
        source,
        kind,
        config.filter.native_gate_threshold,
        store,
        Arc::clone(&counters),
    ) {
        Ok(spider) => spider,
        Err(e) => {
            log::error!("Cannot start job for {}: {}", name, e);
            return JobOutcome::failed(name, e);
        }
    };

    let ticker = StatsTicker::start(
        Arc::clone(&counters),
        lang.as_str(),
        name.as_str(),
        config.stats_dir(&lang).join(format!("{name}.json")),
        config.stats.interval(),
    );

    let outcome = engine.run(&mut spider, &job_dir).await;
    ticker.stop().await;

    outcome
}

/// Pick the crawl variant of a source.
///
/// `auto` uses the sitemap when it yields at least one URL. An explicit
/// `sitemap` mode keeps the sitemap variant even when the harvest is empty.
async fn choose_kind(fetcher: &dyn Fetcher, settings: &CrawlerConfig, source: &Source) -> SpiderKind {
    let recursive = || SpiderKind::Recursive {
        home_url: source.home_url.clone(),
    };

    let mode = source.overrides.mode;
    let sitemap_url = match (mode, source.sitemap_url.as_deref()) {
        (CrawlMode::Recursive, _) => return recursive(),
        (_, None) => {
            if mode == CrawlMode::Sitemap {
                log::warn!("{}: sitemap mode without a sitemap_url", source.name);
            }
            return recursive();
        }
        (_, Some(url)) => url,
    };

    let seeds = match harvest_sitemap(fetcher, sitemap_url, settings.max_child_sitemaps).await {
        Ok(seeds) => seeds,
        Err(e) => {
            log::info!("{}: sitemap {} unusable: {}", source.name, sitemap_url, e);
            Vec::new()
        }
    };

    if seeds.is_empty() && mode == CrawlMode::Auto {
        log::info!("{}: falling back to a recursive crawl", source.name);
        return recursive();
    }

    log::info!("{}: {} URL(s) from {}", source.name, seeds.len(), sitemap_url);
    SpiderKind::Sitemap { seeds }
}

fn log_pass(pass: &PassReport) {
    for outcome in &pass.outcomes {
        report::sub_item(&format!(
            "{}: {} page(s), {}",
            outcome.source, outcome.pages_crawled, outcome.reason
        ));
    }
    report::summary(
        &format!("Pass {}", pass.pass),
        &[
            ("Sources", pass.outcomes.len().to_string()),
            ("Completed", pass.completed().to_string()),
            ("Failed", pass.failed().to_string()),
            ("Pages", pass.pages().to_string()),
            ("Checkpoint", pass.checkpoint.display().to_string()),
        ],
    );
}
