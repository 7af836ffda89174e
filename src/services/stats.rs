// src/services/stats.rs

//! Periodic throughput snapshots of running jobs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::{JobStats, PageCounters};

/// Background task ticking a job's counters and writing its stats file.
///
/// [`StatsTicker::stop`] writes a last snapshot and waits for the task.
/// Dropping the ticker without stopping it aborts the task.
#[derive(Debug)]
pub struct StatsTicker {
    handle: Option<JoinHandle<()>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StatsTicker {
    /// Start ticking. The first snapshot is written immediately.
    pub fn start(
        counters: Arc<PageCounters>,
        lang: impl Into<String>,
        source: impl Into<String>,
        path: PathBuf,
        period: Duration,
    ) -> Self {
        let lang = lang.into();
        let source = source.into();
        let period = period.max(Duration::from_millis(1));
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let (stats, last) = tokio::select! {
                    _ = interval.tick() => (counters.tick_snapshot(&lang, &source), false),
                    _ = &mut shutdown_rx => (counters.snapshot(&lang, &source), true),
                };
                if let Err(e) = write_stats(&path, &stats).await {
                    log::warn!("Failed to write stats {}: {}", path.display(), e);
                }
                if last {
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
            shutdown: Some(shutdown),
        }
    }

    /// Write the final snapshot and stop ticking.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::warn!("Stats task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for StatsTicker {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

/// Overwrite a stats file with a snapshot.
pub async fn write_stats(path: &Path, stats: &JobStats) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string(stats)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Read a stats file written by [`write_stats`].
pub async fn read_stats(path: &Path) -> Result<JobStats> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_snapshot_is_immediate() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stats").join("hi").join("example.in.json");
        let counters = Arc::new(PageCounters::new());
        counters.record_page();
        counters.record_page();

        let ticker = StatsTicker::start(
            Arc::clone(&counters),
            "hi",
            "example.in",
            path.clone(),
            Duration::from_secs(300),
        );

        let mut stats = None;
        for _ in 0..100 {
            if let Ok(s) = read_stats(&path).await {
                stats = Some(s);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let stats = stats.expect("stats file was not written");
        assert_eq!(stats.lang, "hi");
        assert_eq!(stats.source, "example.in");
        assert_eq!(stats.pages_crawled, 2);
        assert_eq!(stats.recent_pgcnts, [0, 0, 0, 0, 0, 2]);
        assert_eq!(counters.current_window(), 0);

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_stop_writes_final_totals() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.json");
        let counters = Arc::new(PageCounters::new());

        let ticker = StatsTicker::start(
            Arc::clone(&counters),
            "ta",
            "src",
            path.clone(),
            Duration::from_secs(300),
        );
        for _ in 0..5 {
            counters.record_page();
        }
        ticker.stop().await;

        let stats = read_stats(&path).await.unwrap();
        assert_eq!(stats.pages_crawled, 5);
    }

    #[tokio::test]
    async fn test_dropped_ticker_stops_ticking() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.json");
        let counters = Arc::new(PageCounters::new());

        let ticker = StatsTicker::start(
            Arc::clone(&counters),
            "ta",
            "src",
            path.clone(),
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(ticker);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let before = counters.recent();
        counters.record_page();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(counters.recent(), before);
        assert_eq!(counters.current_window(), 1);
    }
}
