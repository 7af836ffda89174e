// src/models/mod.rs

//! Domain models for the corpus builder.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod record;
mod source;
mod stats;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, FilterConfig, LoggingConfig, PathsConfig, StatsConfig,
};
pub use record::{ArticleRecord, HtmlRecord, TIMESTAMP_FORMAT, timestamp_now};
pub use source::{CrawlMode, Source, SourceOverrides, SourceRegistry};
pub use stats::{JobStats, PageCounters, WINDOW_COUNT};
