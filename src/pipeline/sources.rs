// src/pipeline/sources.rs

//! Source registration and corpus status.

use crate::error::Result;
use crate::language;
use crate::models::{Config, SourceRegistry};
use crate::services::checkpoint::list_checkpoints;
use crate::services::stats::read_stats;
use crate::storage::{CorpusStore, LocalCorpus};
use crate::utils::report;

/// Register home page URLs as sources of a language.
pub fn run_add_sources(config: &Config, lang: &str, urls: &[String]) -> Result<usize> {
    let registry = SourceRegistry::new(&config.paths.sources_dir);
    let added = registry.register_urls(lang, urls)?;
    let total = registry.load(lang)?.len();

    log::info!(
        "Registered {} source(s) for '{}' ({} total)",
        added,
        lang,
        total
    );
    Ok(added)
}

/// Per-source status of a language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: String,
    pub html_pages: usize,
    pub articles: usize,
    /// Pages crawled in the last run, from the stats file
    pub last_run_pages: Option<u64>,
}

/// Collect the status of every registered source.
pub async fn source_status(config: &Config, lang: &str) -> Result<Vec<SourceStatus>> {
    let sources = SourceRegistry::new(&config.paths.sources_dir).load(lang)?;
    let html = LocalCorpus::new(config.html_dir(lang));
    let articles = LocalCorpus::new(config.articles_dir(lang));
    let stats_dir = config.stats_dir(lang);

    let mut status = Vec::with_capacity(sources.len());
    for source in sources {
        let last_run_pages = read_stats(&stats_dir.join(format!("{}.json", source.name)))
            .await
            .ok()
            .map(|stats| stats.pages_crawled);
        status.push(SourceStatus {
            html_pages: html.count(&source.name).await?,
            articles: articles.count(&source.name).await?,
            last_run_pages,
            name: source.name,
        });
    }
    Ok(status)
}

/// Log the status of a language's corpus.
pub async fn run_info(config: &Config, lang: &str) -> Result<()> {
    let name = language::name_for(lang).unwrap_or(lang);
    report::header(&format!("Corpus status for {name} ({lang})"));

    let status = source_status(config, lang).await?;
    if status.is_empty() {
        log::info!("No sources registered. Use 'add-sources' first.");
    }
    for s in &status {
        let last_run = s
            .last_run_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        report::sub_item(&format!(
            "{}: {} page(s), {} article(s), last run {}",
            s.name, s.html_pages, s.articles, last_run
        ));
    }

    let checkpoints = list_checkpoints(&config.paths.jobdir_root, lang).await?;
    report::summary(
        lang,
        &[
            ("Sources", status.len().to_string()),
            ("Pages", status.iter().map(|s| s.html_pages).sum::<usize>().to_string()),
            ("Articles", status.iter().map(|s| s.articles).sum::<usize>().to_string()),
            ("Checkpoints", checkpoints.len().to_string()),
            (
                "Latest checkpoint",
                checkpoints
                    .last()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
        ],
    );
    Ok(())
}
