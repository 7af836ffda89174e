// src/models/source.rs

//! News sources and the per-language source registry.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::url::source_name;

/// One crawlable news outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Stable identifier derived from the home URL's domain
    pub name: String,

    /// Home page; the recursive crawl starts here
    pub home_url: String,

    /// Sitemap used by the sitemap-driven crawl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap_url: Option<String>,

    /// Language the source is registered under
    #[serde(skip)]
    pub language_code: String,

    /// Source-specific behavior
    #[serde(default, skip_serializing_if = "SourceOverrides::is_default")]
    pub overrides: SourceOverrides,
}

impl Source {
    /// Build a source from a home URL, with the conventional sitemap location.
    pub fn from_home_url(home_url: &str, language_code: &str) -> Result<Self> {
        let parsed = url::Url::parse(home_url)?;
        let name = source_name(home_url)
            .ok_or_else(|| AppError::validation(format!("No host in URL: {home_url}")))?;
        let sitemap_url = parsed.join("sitemap.xml")?.to_string();

        Ok(Self {
            name,
            home_url: home_url.to_string(),
            sitemap_url: Some(sitemap_url),
            language_code: language_code.to_string(),
            overrides: SourceOverrides::default(),
        })
    }
}

/// Which crawl variant a source uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Sitemap when it yields URLs, recursive otherwise
    #[default]
    Auto,
    Sitemap,
    Recursive,
}

/// Per-source customization layered on the base crawl variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOverrides {
    #[serde(default)]
    pub mode: CrawlMode,

    /// Skip URLs that were already fetched
    #[serde(default = "default_dedupe")]
    pub dedupe: bool,

    /// CSS selector whose text replaces the default article extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_selector: Option<String>,
}

fn default_dedupe() -> bool {
    true
}

impl SourceOverrides {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for SourceOverrides {
    fn default() -> Self {
        Self {
            mode: CrawlMode::Auto,
            dedupe: true,
            content_selector: None,
        }
    }
}

/// File-backed registry of sources, one JSON file per language.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    dir: PathBuf,
}

impl SourceRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("{lang}.json"))
    }

    /// Load all sources of a language. A missing file means no sources.
    pub fn load(&self, lang: &str) -> Result<Vec<Source>> {
        let path = self.path(lang);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut sources: Vec<Source> = serde_json::from_str(&content)?;
        for source in &mut sources {
            source.language_code = lang.to_string();
        }
        Ok(sources)
    }

    /// Save all sources of a language, replacing the file.
    pub fn save(&self, lang: &str, sources: &[Source]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(sources)?;
        fs::write(self.path(lang), json)?;
        Ok(())
    }

    /// Add a source, replacing any source with the same name.
    pub fn add(&self, lang: &str, source: Source) -> Result<()> {
        let mut sources = self.load(lang)?;
        match sources.iter_mut().find(|s| s.name == source.name) {
            Some(existing) => *existing = source,
            None => sources.push(source),
        }
        self.save(lang, &sources)
    }

    /// Register home page URLs as sources. Returns the number registered.
    pub fn register_urls<S: AsRef<str>>(&self, lang: &str, urls: &[S]) -> Result<usize> {
        let mut sources = self.load(lang)?;
        let mut registered = 0;

        for url in urls {
            let source = match Source::from_home_url(url.as_ref(), lang) {
                Ok(source) => source,
                Err(e) => {
                    log::warn!("Skipping source {}: {}", url.as_ref(), e);
                    continue;
                }
            };
            match sources.iter_mut().find(|s| s.name == source.name) {
                Some(existing) => *existing = source,
                None => sources.push(source),
            }
            registered += 1;
        }

        self.save(lang, &sources)?;
        Ok(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_home_url() {
        let source = Source::from_home_url("https://www.example.in/news/", "hi").unwrap();
        assert_eq!(source.name, "example.in");
        assert_eq!(
            source.sitemap_url.as_deref(),
            Some("https://www.example.in/news/sitemap.xml")
        );
        assert_eq!(source.language_code, "hi");
    }

    #[test]
    fn test_missing_registry_is_empty() {
        let tmp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(tmp.path());
        assert!(registry.load("ta").unwrap().is_empty());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let tmp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(tmp.path());

        let count = registry
            .register_urls("hi", &["https://a.example.com", "not a url", "https://b.example.com"])
            .unwrap();
        assert_eq!(count, 2);

        registry
            .register_urls("hi", &["https://a.example.com/home"])
            .unwrap();

        let sources = registry.load("hi").unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].home_url, "https://a.example.com/home");
        assert!(sources.iter().all(|s| s.language_code == "hi"));
    }

    #[test]
    fn test_overrides_deserialize() {
        let json = r#"[
            {"name": "plain.com", "home_url": "https://plain.com"},
            {"name": "odd.com", "home_url": "https://odd.com",
             "overrides": {"mode": "recursive", "dedupe": false,
                           "content_selector": ".entry-content"}}
        ]"#;
        let sources: Vec<Source> = serde_json::from_str(json).unwrap();

        assert_eq!(sources[0].overrides, SourceOverrides::default());
        assert!(sources[0].sitemap_url.is_none());
        assert_eq!(sources[1].overrides.mode, CrawlMode::Recursive);
        assert!(!sources[1].overrides.dedupe);
        assert_eq!(
            sources[1].overrides.content_selector.as_deref(),
            Some(".entry-content")
        );
    }
}
