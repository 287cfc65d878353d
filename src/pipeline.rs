//! Pipeline driver: one document in, one per-chunk status report out.
//!
//! Chunks are processed strictly in order — embed, then write, then the next
//! chunk — so log output and store arrival order follow document order.
//! Embedding and store failures are both isolated to the chunk they hit:
//! they are logged, recorded in the report, and processing continues.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::chunking::{ChunkingConfig, chunk_text};
use crate::embeddings::EmbeddingProvider;
use crate::extract;
use crate::identity;
use crate::stores::{EmbeddingRecord, EmbeddingStore};
use crate::types::IngestError;

/// Source for one ingestion run: raw text, or a URL to fetch and extract.
#[derive(Clone, Debug)]
pub enum IngestInput {
    Text(String),
    Url(Url),
}

/// What happened to one chunk.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ChunkOutcome {
    Stored,
    EmbeddingFailed(String),
    StoreFailed(String),
}

/// Per-chunk entry in the ingestion report.
#[derive(Clone, Debug, Serialize)]
pub struct ChunkStatus {
    pub chunk_id: Uuid,
    pub chars: usize,
    #[serde(flatten)]
    pub outcome: ChunkOutcome,
}

/// Result of ingesting one document.
#[derive(Clone, Debug, Serialize)]
pub struct IngestReport {
    pub doc_id: Uuid,
    pub chunks: Vec<ChunkStatus>,
}

impl IngestReport {
    /// Number of chunks that made it into the store.
    pub fn stored(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.outcome == ChunkOutcome::Stored)
            .count()
    }

    /// Number of chunks that failed to embed or to persist.
    pub fn failed(&self) -> usize {
        self.chunks.len() - self.stored()
    }
}

/// Orchestrates extract → chunk → embed → store for one input.
///
/// The embedding provider and store are injected at construction; the
/// pipeline holds no ambient process state.
pub struct IngestPipeline {
    client: Client,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn EmbeddingStore>,
    chunking: ChunkingConfig,
}

impl IngestPipeline {
    pub fn new(
        client: Client,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn EmbeddingStore>,
    ) -> Self {
        Self {
            client,
            provider,
            store,
            chunking: ChunkingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_chunking_config(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Runs the pipeline for one input.
    ///
    /// Fetch failures abort the run; per-chunk embedding and store failures
    /// do not, and are reported through the returned [`IngestReport`].
    pub async fn ingest(&self, input: IngestInput) -> Result<IngestReport, IngestError> {
        let text = match input {
            IngestInput::Text(text) => text,
            IngestInput::Url(url) => extract::fetch_text(&self.client, &url).await?,
        };

        let doc_id = identity::document_id(&text);
        let chunks = chunk_text(&text, &self.chunking);
        info!(%doc_id, chunk_count = chunks.len(), "chunked document");

        let mut statuses = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let chunk_id = identity::chunk_id(&doc_id, &chunk);
            let chars = chunk.chars().count();

            let outcome = match self.provider.embed(&chunk).await {
                Ok(embedding) => {
                    let record = EmbeddingRecord {
                        id: chunk_id,
                        content: chunk,
                        embedding,
                        original_doc_id: doc_id,
                    };
                    match self.store.insert(record).await {
                        Ok(()) => ChunkOutcome::Stored,
                        Err(err) => {
                            warn!(%chunk_id, error = %err, "store write failed, continuing");
                            ChunkOutcome::StoreFailed(err.to_string())
                        }
                    }
                }
                Err(err) => {
                    warn!(%chunk_id, error = %err, "embedding request failed, continuing");
                    ChunkOutcome::EmbeddingFailed(err.to_string())
                }
            };
            statuses.push(ChunkStatus {
                chunk_id,
                chars,
                outcome,
            });
        }

        let report = IngestReport {
            doc_id,
            chunks: statuses,
        };
        info!(
            %doc_id,
            stored = report.stored(),
            failed = report.failed(),
            "ingestion finished"
        );
        Ok(report)
    }
}
