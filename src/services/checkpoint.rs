// src/services/checkpoint.rs

//! Snapshots of job state between passes.
//!
//! ```text
//! {jobdir_root}/
//! ├── current/{lang}/{source}/frontier.json   # live job state
//! ├── ckp_hi_1030_0102/                       # copy taken after a pass
//! └── ckp_hi_1030_0102-2/                     # second pass in the same minute
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{AppError, Result};

/// Checkpoint name suffix for a local time, `HHMM_DDMM`.
pub fn checkpoint_id(at: DateTime<Local>) -> String {
    at.format("%H%M_%d%m").to_string()
}

/// Copy `{jobdir_root}/current/{lang}` to a new checkpoint directory.
///
/// Returns the checkpoint path. Any I/O failure is an error.
pub async fn create_checkpoint(jobdir_root: &Path, lang: &str) -> Result<PathBuf> {
    let source = jobdir_root.join("current").join(lang);
    let base = format!("ckp_{}_{}", lang, checkpoint_id(Local::now()));

    let mut target = jobdir_root.join(&base);
    let mut suffix = 2;
    while tokio::fs::try_exists(&target)
        .await
        .map_err(|e| AppError::checkpoint(&target, e))?
    {
        target = jobdir_root.join(format!("{base}-{suffix}"));
        suffix += 1;
    }

    copy_tree(&source, &target).await?;
    log::info!(
        "Checkpoint of {} written to {}",
        source.display(),
        target.display()
    );
    Ok(target)
}

/// Recursively copy a directory tree.
pub async fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    let mut stack = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src, dst)) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&src)
            .await
            .map_err(|e| AppError::checkpoint(&src, e))?;
        tokio::fs::create_dir_all(&dst)
            .await
            .map_err(|e| AppError::checkpoint(&dst, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::checkpoint(&src, e))?
        {
            let path = entry.path();
            let target = dst.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| AppError::checkpoint(&path, e))?;

            if file_type.is_dir() {
                stack.push((path, target));
            } else {
                tokio::fs::copy(&path, &target)
                    .await
                    .map_err(|e| AppError::checkpoint(&path, e))?;
            }
        }
    }

    Ok(())
}

/// Checkpoint directories of a language, oldest name first.
pub async fn list_checkpoints(jobdir_root: &Path, lang: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("ckp_{lang}_");
    let mut entries = match tokio::fs::read_dir(jobdir_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::Io(e)),
    };

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix))
        {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

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

    #[test]
    fn test_checkpoint_id_format() {
        let at = Local.with_ymd_and_hms(2024, 2, 1, 9, 5, 0).unwrap();
        assert_eq!(checkpoint_id(at), "0905_0102");
    }

    #[tokio::test]
    async fn test_checkpoint_is_identical_copy() {
        let tmp = TempDir::new().unwrap();
        let current = tmp.path().join("current").join("hi");
        std::fs::create_dir_all(current.join("a.in")).unwrap();
        std::fs::create_dir_all(current.join("b.in").join("nested")).unwrap();
        std::fs::write(current.join("a.in").join("frontier.json"), "{\"x\":1}").unwrap();
        std::fs::write(current.join("b.in").join("nested").join("f"), [0u8, 159, 146]).unwrap();

        let checkpoint = create_checkpoint(tmp.path(), "hi").await.unwrap();

        assert!(
            checkpoint
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("ckp_hi_"))
        );
        assert_eq!(read_tree(&checkpoint), read_tree(&current));
    }

    #[tokio::test]
    async fn test_same_minute_checkpoints_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("current").join("ta").join("s")).unwrap();

        let first = create_checkpoint(tmp.path(), "ta").await.unwrap();
        let second = create_checkpoint(tmp.path(), "ta").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(list_checkpoints(tmp.path(), "ta").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_source_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = create_checkpoint(tmp.path(), "kn").await;
        assert!(matches!(result, Err(AppError::Checkpoint { .. })));
    }
}
