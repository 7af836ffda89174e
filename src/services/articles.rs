// src/services/articles.rs

//! Article extraction and the native-script validity filter.
//!
//! Turns the HTML corpus of a language into an article corpus: every stored
//! page is reduced to a title and body, and only bodies with a dense enough
//! run of in-script text are kept.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::language::ScriptClassifier;
use crate::models::{ArticleRecord, FilterConfig, HtmlRecord};
use crate::storage::CorpusStore;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").unwrap());

/// Title and body text of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub body: String,
}

/// Extracts article text from sanitized HTML.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Extracted;
}

/// Default extractor: the page's paragraphs, one per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphExtractor;

impl TextExtractor for ParagraphExtractor {
    fn extract(&self, html: &str) -> Extracted {
        let document = Html::parse_document(html);
        let body = document
            .select(&PARAGRAPH_SELECTOR)
            .map(normalized_text)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Extracted {
            title: page_title(&document),
            body,
        }
    }
}

/// Extractor reading the text nodes under a source-specific CSS selector.
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    selector: Selector,
}

impl SelectorExtractor {
    pub fn new(selector: &str) -> Result<Self> {
        let selector =
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        Ok(Self { selector })
    }
}

impl TextExtractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Extracted {
        let document = Html::parse_document(html);
        let body = document
            .select(&self.selector)
            .flat_map(|el| el.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Extracted {
            title: page_title(&document),
            body,
        }
    }
}

fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<title>` when present, otherwise the first `<h1>`.
fn page_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .chain(document.select(&H1_SELECTOR))
        .map(normalized_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Largest number of in-script characters in any window of exactly `window`
/// characters. `None` when the text is shorter than one window.
pub fn max_window_count(text: &str, window: usize, classifier: &ScriptClassifier) -> Option<usize> {
    let flags: Vec<usize> = text
        .chars()
        .map(|ch| usize::from(classifier.contains(ch)))
        .collect();
    if window == 0 || flags.len() < window {
        return None;
    }

    let mut sum: usize = flags[..window].iter().sum();
    let mut best = sum;
    for i in window..flags.len() {
        sum = sum + flags[i] - flags[i - window];
        best = best.max(sum);
    }
    Some(best)
}

/// Whether a body is a genuine article in the classifier's script.
///
/// Bodies shorter than `window` characters are rejected; otherwise some
/// window must hold at least `threshold` in-script characters.
pub fn is_valid_article(
    body: &str,
    window: usize,
    threshold: usize,
    classifier: &ScriptClassifier,
) -> bool {
    max_window_count(body, window, classifier).is_some_and(|best| best >= threshold)
}

/// Counts of one article run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

enum ItemOutcome {
    Accepted,
    Rejected,
}

/// Builds the article corpus of a language from its HTML corpus.
pub struct ArticleProcessor {
    classifier: Arc<ScriptClassifier>,
    filter: FilterConfig,
    input: Arc<dyn CorpusStore>,
    output: Arc<dyn CorpusStore>,
    default_extractor: Arc<dyn TextExtractor>,
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
}

impl ArticleProcessor {
    pub fn new(
        lang: &str,
        filter: &FilterConfig,
        input: Arc<dyn CorpusStore>,
        output: Arc<dyn CorpusStore>,
    ) -> Result<Self> {
        let classifier = ScriptClassifier::for_language(lang)
            .ok_or_else(|| AppError::UnsupportedLanguage(lang.to_string()))?;

        Ok(Self {
            classifier: Arc::new(classifier),
            filter: filter.clone(),
            input,
            output,
            default_extractor: Arc::new(ParagraphExtractor),
            extractors: HashMap::new(),
        })
    }

    /// Use a specific extractor for one category (source).
    pub fn with_extractor(
        mut self,
        category: impl Into<String>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        self.extractors.insert(category.into(), extractor);
        self
    }

    fn extractor_for(&self, category: &str) -> Arc<dyn TextExtractor> {
        self.extractors
            .get(category)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.default_extractor))
    }

    /// Process every stored page. Item failures are counted, not returned.
    pub async fn run(&self) -> Result<ProcessReport> {
        let mut items = Vec::new();
        for category in self.input.categories().await? {
            for key in self.input.keys(&category).await? {
                items.push((category.clone(), key));
            }
        }

        let mut report = ProcessReport {
            total: items.len(),
            ..ProcessReport::default()
        };
        let workers = self.filter.worker_count();
        log::info!(
            "Checking {} page(s) for {} text with {} worker(s)",
            report.total,
            self.classifier.script(),
            workers
        );

        let mut results = stream::iter(items)
            .map(|(category, key)| async move {
                let outcome = self.process_item(&category, &key).await;
                (category, key, outcome)
            })
            .buffer_unordered(workers);

        let mut done = 0;
        while let Some((category, key, outcome)) = results.next().await {
            match outcome {
                Ok(ItemOutcome::Accepted) => report.accepted += 1,
                Ok(ItemOutcome::Rejected) => report.rejected += 1,
                Err(e) => {
                    report.failed += 1;
                    log::warn!("Failed to process {}/{}: {}", category, key, e);
                }
            }

            done += 1;
            if done % 1000 == 0 {
                log::info!("Processed {}/{} page(s)", done, report.total);
            }
        }

        Ok(report)
    }

    async fn process_item(&self, category: &str, key: &str) -> Result<ItemOutcome> {
        let data = self
            .input
            .read(category, key)
            .await?
            .ok_or_else(|| AppError::validation(format!("{category}/{key} vanished")))?;

        let extractor = self.extractor_for(category);
        let classifier = Arc::clone(&self.classifier);
        let window = self.filter.window_size;
        let threshold = self.filter.window_threshold;

        let article = tokio::task::spawn_blocking(move || -> Result<Option<ArticleRecord>> {
            let record: HtmlRecord = serde_json::from_str(&data)?;
            let Extracted { title, body } = extractor.extract(&record.html);
            if !is_valid_article(&body, window, threshold, &classifier) {
                return Ok(None);
            }
            Ok(Some(ArticleRecord::from_html(&record, title, body)))
        })
        .await??;

        match article {
            Some(article) => {
                let payload = serde_json::to_string(&article)?;
                self.output.add(category, &article.url, &payload).await?;
                Ok(ItemOutcome::Accepted)
            }
            None => Ok(ItemOutcome::Rejected),
        }
    }
}
