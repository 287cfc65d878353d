//! Persistence for chunk embeddings.
//!
//! The [`EmbeddingStore`] trait is the seam between the pipeline and any
//! concrete backend. One record is written per chunk, and every write carries
//! its own error channel so a failed row never blocks the rest of a document.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::IngestError;

pub use sqlite::SqliteEmbeddingStore;

/// One persisted chunk row: identifier, text, vector, and document lineage.
///
/// Rows are immutable after creation; re-ingesting identical input derives the
/// same `id` and lands on the existing row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: Uuid,
    pub content: String,
    pub embedding: Vec<f32>,
    pub original_doc_id: Uuid,
}

/// Row-oriented store with per-write error reporting.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Writes one record. Idempotent for identical ids.
    async fn insert(&self, record: EmbeddingRecord) -> Result<(), IngestError>;
}
