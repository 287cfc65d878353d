//! Chunking-and-ingestion pipeline for embedding generation.
//!
//! ```text
//! {text | url} ──► extract::fetch_text ──► chunking::chunk_text
//!                                                │
//!                              for each chunk, in order:
//!                                identity::chunk_id
//!                                EmbeddingProvider::embed
//!                                EmbeddingStore::insert
//!                                                │
//!                                                ▼
//!                                  IngestReport (per-chunk statuses)
//! ```
//!
//! A document — raw text, or a page fetched from a URL and reduced to plain
//! text — is split into chunks of at most 250 characters (whole paragraphs
//! first, sentence regrouping as a fallback), embedded chunk by chunk, and
//! persisted with deterministic UUIDv5 lineage identifiers so re-ingesting
//! identical input is idempotent.
//!
//! [`pipeline::IngestPipeline`] is the entry point for library use;
//! [`server::router`] wraps it in an HTTP endpoint.

pub mod chunking;
pub mod embeddings;
pub mod extract;
pub mod identity;
pub mod pipeline;
pub mod server;
pub mod stores;
pub mod types;

pub use chunking::{ChunkingConfig, chunk_text};
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider, OpenAiEmbeddingProvider};
pub use pipeline::{ChunkOutcome, ChunkStatus, IngestInput, IngestPipeline, IngestReport};
pub use stores::{EmbeddingRecord, EmbeddingStore, SqliteEmbeddingStore};
pub use types::IngestError;
