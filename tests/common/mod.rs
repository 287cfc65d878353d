//! Shared test doubles for the integration suites.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chunkwright::stores::{EmbeddingRecord, EmbeddingStore};
use chunkwright::types::IngestError;

/// In-memory store that keeps every inserted record.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EmbeddingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EmbeddingRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingStore for MemoryStore {
    async fn insert(&self, record: EmbeddingRecord) -> Result<(), IngestError> {
        let mut records = self.records.lock().unwrap();
        records.retain(|existing| existing.id != record.id);
        records.push(record);
        Ok(())
    }
}

/// Store that fails exactly one insert (1-based), succeeding otherwise.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_on: usize,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn records(&self) -> Vec<EmbeddingRecord> {
        self.inner.records()
    }
}

#[async_trait]
impl EmbeddingStore for FlakyStore {
    async fn insert(&self, record: EmbeddingRecord) -> Result<(), IngestError> {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(IngestError::Storage("simulated write failure".into()));
        }
        self.inner.insert(record).await
    }
}
