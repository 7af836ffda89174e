// src/error.rs

//! Unified error handling for the corpus builder.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Sitemap XML could not be read
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A worker task panicked or was cancelled
    #[error("Task error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// No script is known for the language code
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A single page could not be crawled
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },

    /// A whole crawl job is unrecoverable
    #[error("Job for {source_name} failed: {message}")]
    JobFailed {
        source_name: String,
        message: String,
    },

    /// Checkpoint copy failed
    #[error("Checkpoint error at {path}: {message}")]
    Checkpoint { path: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a job-fatal error.
    pub fn job_failed(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::JobFailed {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Create a checkpoint error for a path.
    pub fn checkpoint(path: &Path, message: impl fmt::Display) -> Self {
        Self::Checkpoint {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
