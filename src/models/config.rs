//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch engine settings, passed through to every crawl job
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Stats snapshot settings
    #[serde(default)]
    pub stats: StatsConfig,

    /// Native-script thresholds
    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.concurrent_requests == 0 {
            return Err(AppError::validation(
                "crawler.concurrent_requests must be > 0",
            ));
        }
        if self.crawler.concurrent_requests_per_domain == 0 {
            return Err(AppError::validation(
                "crawler.concurrent_requests_per_domain must be > 0",
            ));
        }
        if self.stats.interval_secs == 0 {
            return Err(AppError::validation("stats.interval_secs must be > 0"));
        }
        if self.filter.window_size == 0 {
            return Err(AppError::validation("filter.window_size must be > 0"));
        }
        if self.filter.window_threshold > self.filter.window_size {
            return Err(AppError::validation(
                "filter.window_threshold must not exceed filter.window_size",
            ));
        }
        Ok(())
    }

    /// Directory holding the raw HTML corpus of a language.
    pub fn html_dir(&self, lang: &str) -> PathBuf {
        self.paths.corpus_dir.join(lang).join("html")
    }

    /// Directory holding the validated article corpus of a language.
    pub fn articles_dir(&self, lang: &str) -> PathBuf {
        self.paths.corpus_dir.join(lang).join("articles")
    }

    /// Root of the live job directories of a language.
    pub fn jobdir_lang_root(&self, lang: &str) -> PathBuf {
        self.paths.jobdir_root.join("current").join(lang)
    }

    /// Directory holding stats snapshots of a language.
    pub fn stats_dir(&self, lang: &str) -> PathBuf {
        self.paths.log_dir.join("stats").join(lang)
    }
}

/// Fetch engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay before each request of a job, in milliseconds
    #[serde(default)]
    pub download_delay_ms: u64,

    /// Maximum in-flight requests across all jobs
    #[serde(default = "defaults::concurrent_requests")]
    pub concurrent_requests: usize,

    /// Maximum in-flight requests within one job
    #[serde(default = "defaults::concurrent_requests_per_domain")]
    pub concurrent_requests_per_domain: usize,

    /// Extra attempts after a failed request
    #[serde(default = "defaults::retry_times")]
    pub retry_times: u32,

    /// Maximum link depth from the seed (0 = unlimited)
    #[serde(default)]
    pub max_depth: u32,

    /// Maximum pages fetched per job per pass (0 = unlimited)
    #[serde(default)]
    pub max_pages_per_pass: u64,

    /// Persist the frontier after this many completed requests
    #[serde(default = "defaults::frontier_flush_every")]
    pub frontier_flush_every: usize,

    /// Maximum child sitemaps followed from a sitemap index
    #[serde(default = "defaults::max_child_sitemaps")]
    pub max_child_sitemaps: usize,
}

impl CrawlerConfig {
    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            download_delay_ms: 0,
            concurrent_requests: defaults::concurrent_requests(),
            concurrent_requests_per_domain: defaults::concurrent_requests_per_domain(),
            retry_times: defaults::retry_times(),
            max_depth: 0,
            max_pages_per_pass: 0,
            frontier_flush_every: defaults::frontier_flush_every(),
            max_child_sitemaps: defaults::max_child_sitemaps(),
        }
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Source registry files (`{lang}.json`)
    #[serde(default = "defaults::sources_dir")]
    pub sources_dir: PathBuf,

    /// Corpus root (`{lang}/html`, `{lang}/articles`)
    #[serde(default = "defaults::corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Job state root (`current/{lang}/{source}`, checkpoints)
    #[serde(default = "defaults::jobdir_root")]
    pub jobdir_root: PathBuf,

    /// Log root (`stats/{lang}/{source}.json`)
    #[serde(default = "defaults::log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources_dir: defaults::sources_dir(),
            corpus_dir: defaults::corpus_dir(),
            jobdir_root: defaults::jobdir_root(),
            log_dir: defaults::log_dir(),
        }
    }
}

/// Stats snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Length of one throughput window in seconds
    #[serde(default = "defaults::stats_interval")]
    pub interval_secs: u64,
}

impl StatsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::stats_interval(),
        }
    }
}

/// Native-script thresholds for crawling and article validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum in-script characters on a page before its links are followed
    #[serde(default = "defaults::native_gate_threshold")]
    pub native_gate_threshold: usize,

    /// Window length for the article density check
    #[serde(default = "defaults::window_size")]
    pub window_size: usize,

    /// Minimum in-script characters inside the densest window
    #[serde(default = "defaults::window_threshold")]
    pub window_threshold: usize,

    /// Article workers (0 = available parallelism)
    #[serde(default)]
    pub workers: usize,
}

impl FilterConfig {
    /// Number of article workers to run.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            native_gate_threshold: defaults::native_gate_threshold(),
            window_size: defaults::window_size(),
            window_threshold: defaults::window_threshold(),
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; webcorpus/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn concurrent_requests() -> usize {
        16
    }
    pub fn concurrent_requests_per_domain() -> usize {
        8
    }
    pub fn retry_times() -> u32 {
        2
    }
    pub fn frontier_flush_every() -> usize {
        50
    }
    pub fn max_child_sitemaps() -> usize {
        50
    }

    // Path defaults
    pub fn sources_dir() -> PathBuf {
        PathBuf::from("data/sources")
    }
    pub fn corpus_dir() -> PathBuf {
        PathBuf::from("data/corpus")
    }
    pub fn jobdir_root() -> PathBuf {
        PathBuf::from("data/jobs")
    }
    pub fn log_dir() -> PathBuf {
        PathBuf::from("data/logs")
    }

    // Stats defaults
    pub fn stats_interval() -> u64 {
        300
    }

    // Filter defaults
    pub fn native_gate_threshold() -> usize {
        100
    }
    pub fn window_size() -> usize {
        250
    }
    pub fn window_threshold() -> usize {
        200
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
