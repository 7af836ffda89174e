//! Utility functions and helpers.

pub mod html;
pub mod http;
pub mod report;
pub mod sitemap;
pub mod url;

use sha2::{Digest, Sha256};

/// Stable, filesystem-safe key for an arbitrary identifier.
pub fn hash_key(identifier: &str) -> String {
    hex::encode(Sha256::digest(identifier.as_bytes()))
}
