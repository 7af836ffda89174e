//! End-to-end crawl and article extraction against an in-memory web.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use webcorpus::error::{AppError, Result};
use webcorpus::models::{ArticleRecord, Config, CrawlMode, HtmlRecord, Source, SourceRegistry};
use webcorpus::pipeline::{Orchestrator, run_process};
use webcorpus::services::stats::read_stats;
use webcorpus::services::{FetchedPage, Fetcher, JobState};
use webcorpus::storage::{CorpusStore, LocalCorpus};

#[derive(Default)]
struct FakeWeb {
    pages: HashMap<String, String>,
    dead_domains: Vec<String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeWeb {
    fn page(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeWeb {
    async fn resolve(&self, domain: &str) -> Result<()> {
        if self.dead_domains.iter().any(|d| d == domain) {
            return Err(AppError::crawl(domain, "DNS lookup failed"));
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .map(|body| FetchedPage::html(url, body.clone()))
            .ok_or_else(|| AppError::crawl(url, "404"))
    }
}

fn article_page(text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">more</a>"#))
        .collect();
    format!(
        "<html><head><title>खबर</title><script>track()</script></head>\
         <body><p>{text}</p>{anchors}</body></html>"
    )
}

fn hindi(n: usize) -> String {
    "नमस्ते दुनिया ".repeat(n)
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.sources_dir = root.join("sources");
    config.paths.corpus_dir = root.join("corpus");
    config.paths.jobdir_root = root.join("jobs");
    config.paths.log_dir = root.join("logs");
    config.crawler.retry_times = 0;
    config
}

fn source(name: &str, home: &str, sitemap: Option<&str>, mode: CrawlMode) -> Source {
    let mut source = Source::from_home_url(home, "hi").unwrap();
    source.name = name.to_string();
    source.sitemap_url = sitemap.map(str::to_string);
    source.overrides.mode = mode;
    source
}

fn read_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                files.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn crawl_checkpoint_and_extract() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(tmp.path()));

    let registry = SourceRegistry::new(&config.paths.sources_dir);
    registry
        .save(
            "hi",
            &[
                source("dainik.in", "https://dainik.in/", None, CrawlMode::Auto),
                source(
                    "samachar.in",
                    "https://samachar.in/",
                    Some("https://samachar.in/sitemap.xml"),
                    CrawlMode::Auto,
                ),
                source("offline.in", "https://offline.in/", None, CrawlMode::Recursive),
            ],
        )
        .unwrap();

    let web = Arc::new(
        FakeWeb {
            dead_domains: vec!["offline.in".to_string()],
            ..FakeWeb::default()
        }
        // Recursive source: home links to a story and off-site
        .page(
            "https://dainik.in/",
            article_page(&hindi(20), &["/story", "https://elsewhere.com/"]),
        )
        .page("https://dainik.in/story", article_page(&hindi(40), &["/"]))
        // Sitemap source: links on its pages are never followed
        .page(
            "https://samachar.in/sitemap.xml",
            "<urlset><url><loc>https://samachar.in/1</loc></url>\
             <url><loc>https://samachar.in/2</loc></url></urlset>"
                .to_string(),
        )
        .page("https://samachar.in/1", article_page(&hindi(40), &["/hidden"]))
        .page(
            "https://samachar.in/2",
            article_page("English only article text", &["/hidden"]),
        ),
    );

    let orchestrator = Orchestrator::new(Arc::clone(&config), "hi", web.clone()).unwrap();
    let mut reports = Vec::new();
    let passes = orchestrator
        .run(|report| {
            reports.push(report.clone());
            true
        })
        .await
        .unwrap();

    assert_eq!(passes, 1);
    let report = &reports[0];
    assert_eq!(report.completed(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.pages(), 4);

    let offline = report
        .outcomes
        .iter()
        .find(|o| o.source == "offline.in")
        .unwrap();
    assert_eq!(offline.state, JobState::Failed);

    let fetched = web.fetched();
    assert!(!fetched.iter().any(|u| u.contains("elsewhere.com")));
    assert!(!fetched.iter().any(|u| u.ends_with("/hidden")));

    // Stored pages are sanitized records
    let html = LocalCorpus::new(config.html_dir("hi"));
    assert_eq!(html.count("dainik.in").await.unwrap(), 2);
    assert_eq!(html.count("samachar.in").await.unwrap(), 2);
    let stored = html
        .get("dainik.in", "https://dainik.in/story")
        .await
        .unwrap()
        .unwrap();
    let record: HtmlRecord = serde_json::from_str(&stored).unwrap();
    assert_eq!(record.source_name, "dainik.in");
    assert!(!record.html.contains("track()"));

    // Stats reflect the finished job
    let stats = read_stats(&config.stats_dir("hi").join("dainik.in.json"))
        .await
        .unwrap();
    assert_eq!(stats.pages_crawled, 2);

    // The checkpoint is a byte-identical copy of the live job state
    let current = config.jobdir_lang_root("hi");
    assert!(current.join("dainik.in").join("frontier.json").exists());
    assert_eq!(read_tree(&report.checkpoint), read_tree(&current));

    // Only the Hindi articles pass the density filter
    let processed = run_process(&config, "hi").await.unwrap();
    assert_eq!(processed.total, 4);
    assert_eq!(processed.accepted, 3);
    assert_eq!(processed.rejected, 1);
    assert_eq!(processed.failed, 0);

    let articles = LocalCorpus::new(config.articles_dir("hi"));
    let stored = articles
        .get("samachar.in", "https://samachar.in/1")
        .await
        .unwrap()
        .unwrap();
    let article: ArticleRecord = serde_json::from_str(&stored).unwrap();
    assert_eq!(article.title, "खबर");
    assert_eq!(article.timestamp, record_timestamp(&html, "samachar.in", "https://samachar.in/1").await);
    assert!(
        articles
            .get("samachar.in", "https://samachar.in/2")
            .await
            .unwrap()
            .is_none()
    );
}

async fn record_timestamp(store: &LocalCorpus, category: &str, url: &str) -> String {
    let stored = store.get(category, url).await.unwrap().unwrap();
    let record: HtmlRecord = serde_json::from_str(&stored).unwrap();
    record.timestamp
}

#[tokio::test]
async fn second_pass_resumes_instead_of_recrawling() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(tmp.path()));

    SourceRegistry::new(&config.paths.sources_dir)
        .save(
            "hi",
            &[source("dainik.in", "https://dainik.in/", None, CrawlMode::Recursive)],
        )
        .unwrap();

    let web = Arc::new(
        FakeWeb::default()
            .page("https://dainik.in/", article_page(&hindi(20), &["/a", "/b"]))
            .page("https://dainik.in/a", article_page(&hindi(20), &["/b"]))
            .page("https://dainik.in/b", article_page(&hindi(20), &[])),
    );

    let orchestrator = Orchestrator::new(Arc::clone(&config), "hi", web.clone()).unwrap();
    let mut pages = Vec::new();
    let passes = orchestrator
        .run(|report| {
            pages.push(report.pages());
            report.pass >= 2
        })
        .await
        .unwrap();

    assert_eq!(passes, 2);
    // Second pass only revisits the home page
    assert_eq!(pages, vec![3, 1]);
    assert_eq!(
        web.fetched()
            .iter()
            .filter(|u| u.as_str() == "https://dainik.in/a")
            .count(),
        1
    );
}
