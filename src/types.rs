//! Shared error taxonomy for the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the wikismith pipeline.
///
/// Lookup classifications (ambiguous topics, missing articles) are not
/// errors; they are modeled as [`crate::wiki::FetchOutcome`] values. This
/// enum covers the fail-fast conditions and the boundaries to external
/// services.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(String),

    /// A stage needed a stored page that was never scraped.
    #[error("no stored page for topic '{topic}' at {path}")]
    PageNotFound { topic: String, path: PathBuf },

    #[error("scrape failed: {0}")]
    Scrape(String),

    #[error("chunking failed: {0}")]
    Chunking(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Storage(String),

    #[error("completion failed: {0}")]
    Completion(String),
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        RagError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Http(err.to_string())
    }
}
