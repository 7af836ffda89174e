// src/pipeline/process.rs

//! Article extraction pipeline.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, SourceRegistry};
use crate::services::articles::{ArticleProcessor, ProcessReport, SelectorExtractor};
use crate::storage::{CorpusStore, LocalCorpus};
use crate::utils::report;

/// Build the article corpus of a language from its HTML corpus.
pub async fn run_process(config: &Config, lang: &str) -> Result<ProcessReport> {
    report::header(&format!("Extracting articles for language '{lang}'"));

    let input: Arc<dyn CorpusStore> = Arc::new(LocalCorpus::new(config.html_dir(lang)));
    let output: Arc<dyn CorpusStore> = Arc::new(LocalCorpus::new(config.articles_dir(lang)));
    let mut processor = ArticleProcessor::new(lang, &config.filter, input, output)?;

    let sources = SourceRegistry::new(&config.paths.sources_dir).load(lang)?;
    for source in sources {
        let Some(selector) = source.overrides.content_selector.as_deref() else {
            continue;
        };
        match SelectorExtractor::new(selector) {
            Ok(extractor) => {
                log::debug!("{}: extracting text from '{}'", source.name, selector);
                processor = processor.with_extractor(source.name.clone(), Arc::new(extractor));
            }
            Err(e) => log::warn!("{}: using default extraction: {}", source.name, e),
        }
    }

    let result = processor.run().await?;

    report::summary(
        "Article extraction",
        &[
            ("Pages", result.total.to_string()),
            ("Accepted", result.accepted.to_string()),
            ("Rejected", result.rejected.to_string()),
            ("Failed", result.failed.to_string()),
            ("Output", config.articles_dir(lang).display().to_string()),
        ],
    );

    Ok(result)
}
