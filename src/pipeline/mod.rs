//! Pipeline entry points for corpus operations.
//!
//! - `run_fetch`: Crawl all sources of a language in repeated passes
//! - `run_process`: Extract validated articles from the HTML corpus
//! - `run_add_sources`: Register home pages as sources
//! - `run_info`: Report corpus status

pub mod fetch;
pub mod process;
pub mod sources;

pub use fetch::{Orchestrator, PassReport, run_fetch};
pub use process::run_process;
pub use sources::{run_add_sources, run_info};
