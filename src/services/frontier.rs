// src/services/frontier.rs

//! Persistent crawl frontier.
//!
//! Holds the pending requests and the set of URLs already scheduled for one
//! job. The state lives in `{job_dir}/frontier.json` so an interrupted pass
//! resumes where it stopped and later passes skip pages already fetched.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// File name of the frontier inside a job directory.
pub const FRONTIER_FILE: &str = "frontier.json";

/// A scheduled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: String,
    /// Link distance from the seed
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FrontierState {
    pending: Vec<FrontierEntry>,
    seen: Vec<String>,
}

/// Pending requests plus the deduplication set of one job.
#[derive(Debug)]
pub struct Frontier {
    path: PathBuf,
    pending: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    dedupe: bool,
}

impl Frontier {
    /// Open the frontier of a job directory, resuming any saved state.
    ///
    /// A corrupt state file is discarded with a warning.
    pub async fn open(job_dir: &Path, dedupe: bool) -> Result<Self> {
        let path = job_dir.join(FRONTIER_FILE);

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable frontier {}: {}", path.display(), e);
                FrontierState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FrontierState::default(),
            Err(e) => return Err(AppError::Io(e)),
        };

        if !state.pending.is_empty() {
            log::info!(
                "Resuming {} pending request(s) from {}",
                state.pending.len(),
                path.display()
            );
        }

        Ok(Self {
            path,
            pending: state.pending.into(),
            seen: state.seen.into_iter().collect(),
            dedupe,
        })
    }

    /// Schedule a URL unless it was already seen. Returns whether it was added.
    pub fn push(&mut self, url: impl Into<String>, depth: u32) -> bool {
        let url = url.into();
        if self.dedupe && !self.seen.insert(url.clone()) {
            return false;
        }
        self.pending.push_back(FrontierEntry::new(url, depth));
        true
    }

    /// Schedule a seed URL, bypassing deduplication.
    pub fn push_seed(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.dedupe {
            self.seen.insert(url.clone());
        }
        self.pending.push_back(FrontierEntry::new(url, 0));
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Persist the frontier. Requests still in flight are saved as pending
    /// so a crash does not lose them.
    pub async fn save<'a>(
        &self,
        in_flight: impl IntoIterator<Item = &'a FrontierEntry>,
    ) -> Result<()> {
        let mut pending: Vec<FrontierEntry> = in_flight.into_iter().cloned().collect();
        pending.extend(self.pending.iter().cloned());

        let mut seen: Vec<String> = self.seen.iter().cloned().collect();
        seen.sort();

        let bytes = serde_json::to_vec(&FrontierState { pending, seen })?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
