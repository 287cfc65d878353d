//! Shared error taxonomy for the ingestion pipeline.

use thiserror::Error;

/// Errors surfaced by the chunking-and-ingestion pipeline.
///
/// Fetch failures abort the invocation that triggered them; embedding and
/// storage failures are scoped to a single chunk and reported through the
/// per-chunk status array on [`IngestReport`](crate::pipeline::IngestReport).
#[derive(Debug, Error)]
pub enum IngestError {
    /// Remote content could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The ingest request was malformed (`text`/`url` both present or both missing).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The embedding model call failed for one chunk.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// A store write failed for one chunk.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Fetch(err.to_string())
    }
}
