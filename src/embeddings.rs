//! Embedding providers: the hosted model client and a deterministic mock.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::types::IngestError;

/// Model the original pipeline embeds with.
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";
/// Vector width of [`DEFAULT_MODEL`].
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Turns one chunk of text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError>;

    /// Width of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|err| IngestError::Embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IngestError::Embedding(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| IngestError::Embedding(err.to_string()))?;
        let entry = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::Embedding("response contained no embedding".into()))?;
        Ok(entry.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Deterministic provider for tests: hashes the input into a fixed vector,
/// so identical text always maps to an identical embedding.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 16 }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError> {
        // FNV-1a over the input, then rotate for each lane.
        let mut state: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            state ^= u64::from(byte);
            state = state.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let vector = (0..self.dimensions)
            .map(|lane| {
                let mixed = state.rotate_left((lane % 64) as u32);
                (mixed as f32 / u64::MAX as f32) * 2.0 - 1.0
            })
            .collect();
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
