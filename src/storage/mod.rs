//! Storage abstractions for corpus persistence.
//!
//! A corpus maps a category (the source name) to a set of
//! identifier → payload entries. Writes are idempotent per
//! `(category, identifier)`: adding an identifier again replaces its payload.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! ├── dainik.in/               # category
//! │   ├── 3f7a...c1            # sha256(identifier), payload
//! │   └── 9b02...e4
//! └── khabar.com/
//!     └── 51de...07
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalCorpus;

/// Trait for corpus storage backends.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Store a payload, replacing any payload stored under the same identifier.
    async fn add(&self, category: &str, identifier: &str, payload: &str) -> Result<()>;

    /// Load the payload stored under an identifier.
    async fn get(&self, category: &str, identifier: &str) -> Result<Option<String>>;

    /// All categories with at least one entry.
    async fn categories(&self) -> Result<Vec<String>>;

    /// Storage keys of all entries in a category.
    async fn keys(&self, category: &str) -> Result<Vec<String>>;

    /// Load the payload stored under a storage key.
    async fn read(&self, category: &str, key: &str) -> Result<Option<String>>;

    /// Number of entries in a category.
    async fn count(&self, category: &str) -> Result<usize> {
        Ok(self.keys(category).await?.len())
    }
}
