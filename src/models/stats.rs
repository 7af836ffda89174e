//! Per-job page counters and their persisted snapshot.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Number of throughput windows kept per job.
pub const WINDOW_COUNT: usize = 6;

/// Stats snapshot written to the job's stats file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub lang: String,
    pub source: String,
    pub pages_crawled: u64,
    pub recent_pgcnts: [u64; WINDOW_COUNT],
}

/// Page counters of one crawl job.
///
/// The job's completion handler is the only writer of the counts; the stats
/// ticker is the only caller of [`PageCounters::tick`].
#[derive(Debug, Default)]
pub struct PageCounters {
    pages_crawled: AtomicU64,
    current_window: AtomicU64,
    recent: Mutex<[u64; WINDOW_COUNT]>,
}

impl PageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known window history.
    pub fn with_recent(recent: [u64; WINDOW_COUNT]) -> Self {
        Self {
            recent: Mutex::new(recent),
            ..Self::default()
        }
    }

    /// Record one crawled page.
    pub fn record_page(&self) {
        self.pages_crawled.fetch_add(1, Ordering::Relaxed);
        self.current_window.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_crawled(&self) -> u64 {
        self.pages_crawled.load(Ordering::Relaxed)
    }

    /// Pages recorded since the last tick.
    pub fn current_window(&self) -> u64 {
        self.current_window.load(Ordering::Relaxed)
    }

    pub fn recent(&self) -> [u64; WINDOW_COUNT] {
        *self.recent.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Close the current window: shift the ring left, append the window's
    /// count, and reset the window to zero. Returns the new ring.
    pub fn tick(&self) -> [u64; WINDOW_COUNT] {
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        let count = self.current_window.swap(0, Ordering::Relaxed);
        recent.rotate_left(1);
        recent[WINDOW_COUNT - 1] = count;
        *recent
    }

    /// Tick and build the snapshot for a job.
    pub fn tick_snapshot(&self, lang: &str, source: &str) -> JobStats {
        let recent = self.tick();
        JobStats {
            lang: lang.to_string(),
            source: source.to_string(),
            pages_crawled: self.pages_crawled(),
            recent_pgcnts: recent,
        }
    }

    /// Snapshot without closing the current window.
    pub fn snapshot(&self, lang: &str, source: &str) -> JobStats {
        JobStats {
            lang: lang.to_string(),
            source: source.to_string(),
            pages_crawled: self.pages_crawled(),
            recent_pgcnts: self.recent(),
        }
    }
}
