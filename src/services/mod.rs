//! Service layer for the corpus builder.
//!
//! This module contains the business logic for:
//! - Fetching pages and sitemaps (`Fetcher`, `HttpFetcher`)
//! - Per-source crawl jobs (`Spider`) driven by the fetch engine (`CrawlEngine`)
//! - Persistent crawl frontiers (`Frontier`)
//! - Throughput stats (`StatsTicker`) and job-state checkpoints
//! - Article extraction and validation (`ArticleProcessor`)

pub mod articles;
pub mod checkpoint;
pub mod engine;
pub mod fetcher;
pub mod frontier;
pub mod spider;
pub mod stats;

pub use articles::{
    ArticleProcessor, Extracted, ParagraphExtractor, ProcessReport, SelectorExtractor,
    TextExtractor, is_valid_article,
};
pub use checkpoint::create_checkpoint;
pub use engine::{CloseReason, CrawlEngine, JobOutcome};
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher, harvest_sitemap};
pub use frontier::{Frontier, FrontierEntry};
pub use spider::{JobState, Spider, SpiderKind};
pub use stats::StatsTicker;
