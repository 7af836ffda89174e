//! Local filesystem corpus implementation.
//!
//! One directory per category, one file per identifier. File names are the
//! SHA-256 of the identifier so arbitrary URLs map to safe, fixed-length names.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::CorpusStore;
use crate::utils::hash_key;

const TMP_SUFFIX: &str = "tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem corpus backend.
#[derive(Debug, Clone)]
pub struct LocalCorpus {
    root_dir: PathBuf,
}

impl LocalCorpus {
    /// Create a new LocalCorpus rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Directory of a category, rejecting names that escape the root.
    fn category_dir(&self, category: &str) -> Result<PathBuf> {
        if category.is_empty()
            || category == "."
            || category == ".."
            || category.contains(['/', '\\'])
        {
            return Err(AppError::validation(format!(
                "Invalid corpus category: {category:?}"
            )));
        }
        Ok(self.root_dir.join(category))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{n}.{TMP_SUFFIX}"));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a file, returning None if it doesn't exist.
    async fn read_string(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Names of the entries of a directory matching a predicate.
    async fn list_dir(
        &self,
        dir: &Path,
        keep: impl Fn(&std::fs::FileType, &str) -> bool,
    ) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if let Some(name) = entry.file_name().to_str() {
                if keep(&file_type, name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl CorpusStore for LocalCorpus {
    async fn add(&self, category: &str, identifier: &str, payload: &str) -> Result<()> {
        let path = self.category_dir(category)?.join(hash_key(identifier));
        self.write_bytes(&path, payload.as_bytes()).await
    }

    async fn get(&self, category: &str, identifier: &str) -> Result<Option<String>> {
        self.read(category, &hash_key(identifier)).await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.list_dir(&self.root_dir, |file_type, _| file_type.is_dir())
            .await
    }

    async fn keys(&self, category: &str) -> Result<Vec<String>> {
        let dir = self.category_dir(category)?;
        self.list_dir(&dir, |file_type, name| {
            file_type.is_file() && !name.ends_with(TMP_SUFFIX)
        })
        .await
    }

    async fn read(&self, category: &str, key: &str) -> Result<Option<String>> {
        let path = self.category_dir(category)?.join(key);
        self.read_string(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_and_get() {
        let tmp = TempDir::new().unwrap();
        let corpus = LocalCorpus::new(tmp.path());

        corpus
            .add("dainik.in", "https://dainik.in/a", "payload")
            .await
            .unwrap();

        let data = corpus.get("dainik.in", "https://dainik.in/a").await.unwrap();
        assert_eq!(data.as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let corpus = LocalCorpus::new(tmp.path());

        assert!(corpus.get("nope", "x").await.unwrap().is_none());
        assert!(corpus.keys("nope").await.unwrap().is_empty());
        assert!(corpus.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let corpus = LocalCorpus::new(tmp.path());

        corpus.add("src", "https://src.in/1", "first").await.unwrap();
        corpus.add("src", "https://src.in/1", "second").await.unwrap();

        let keys = corpus.keys("src").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(
            corpus.read("src", &keys[0]).await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_categories_and_count() {
        let tmp = TempDir::new().unwrap();
        let corpus = LocalCorpus::new(tmp.path());

        corpus.add("b.com", "1", "x").await.unwrap();
        corpus.add("a.com", "1", "x").await.unwrap();
        corpus.add("a.com", "2", "y").await.unwrap();

        assert_eq!(corpus.categories().await.unwrap(), vec!["a.com", "b.com"]);
        assert_eq!(corpus.count("a.com").await.unwrap(), 2);
        assert_eq!(corpus.count("b.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_escaping_category() {
        let tmp = TempDir::new().unwrap();
        let corpus = LocalCorpus::new(tmp.path());

        assert!(corpus.add("../etc", "1", "x").await.is_err());
        assert!(corpus.add("", "1", "x").await.is_err());
    }
}
