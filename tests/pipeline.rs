//! End-to-end pipeline tests with mock embeddings.

mod common;

use std::sync::Arc;

use httpmock::Method::GET;
use httpmock::MockServer;
use reqwest::Client;
use tempfile::tempdir;
use url::Url;

use chunkwright::chunking::ChunkingConfig;
use chunkwright::embeddings::MockEmbeddingProvider;
use chunkwright::pipeline::{ChunkOutcome, IngestInput, IngestPipeline};
use chunkwright::stores::SqliteEmbeddingStore;
use chunkwright::types::IngestError;

use common::{FlakyStore, MemoryStore};

fn pipeline_with(store: Arc<dyn chunkwright::stores::EmbeddingStore>) -> IngestPipeline {
    IngestPipeline::new(
        Client::new(),
        Arc::new(MockEmbeddingProvider::new()),
        store,
    )
}

fn three_chunk_text() -> String {
    // Three short paragraphs, each accepted whole by the paragraph phase.
    format!("{}\n\n{}\n\n{}", "a".repeat(80), "b".repeat(90), "c".repeat(100))
}

#[tokio::test]
async fn ingests_text_into_the_sqlite_store() {
    let dir = tempdir().unwrap();
    let store = Arc::new(
        SqliteEmbeddingStore::open(dir.path().join("chunks.sqlite"), 16)
            .await
            .unwrap(),
    );
    let pipeline = pipeline_with(store.clone());

    let report = pipeline
        .ingest(IngestInput::Text(three_chunk_text()))
        .await
        .unwrap();

    assert_eq!(report.chunks.len(), 3);
    assert_eq!(report.stored(), 3);
    assert_eq!(report.failed(), 0);
    assert_eq!(store.count().await.unwrap(), 3);

    let rows = store.get_by_document(report.doc_id).await.unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.original_doc_id, report.doc_id);
        assert_eq!(row.embedding.len(), 16);
    }
}

#[tokio::test]
async fn reingesting_identical_input_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = Arc::new(
        SqliteEmbeddingStore::open(dir.path().join("chunks.sqlite"), 16)
            .await
            .unwrap(),
    );
    let pipeline = pipeline_with(store.clone());

    let first = pipeline
        .ingest(IngestInput::Text(three_chunk_text()))
        .await
        .unwrap();
    let second = pipeline
        .ingest(IngestInput::Text(three_chunk_text()))
        .await
        .unwrap();

    assert_eq!(first.doc_id, second.doc_id);
    let first_ids: Vec<_> = first.chunks.iter().map(|c| c.chunk_id).collect();
    let second_ids: Vec<_> = second.chunks.iter().map(|c| c.chunk_id).collect();
    assert_eq!(first_ids, second_ids);
    // Same keys, same rows: no duplicates on re-ingestion.
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn empty_input_produces_no_chunks_and_no_writes() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());

    let report = pipeline
        .ingest(IngestInput::Text(String::new()))
        .await
        .unwrap();

    assert!(report.chunks.is_empty());
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn one_failed_write_does_not_block_the_other_chunks() {
    let store = Arc::new(FlakyStore::failing_on(2));
    let pipeline = pipeline_with(store.clone());

    let report = pipeline
        .ingest(IngestInput::Text(three_chunk_text()))
        .await
        .unwrap();

    assert_eq!(report.chunks.len(), 3);
    assert_eq!(report.stored(), 2);
    assert!(matches!(
        report.chunks[1].outcome,
        ChunkOutcome::StoreFailed(_)
    ));
    assert!(matches!(report.chunks[0].outcome, ChunkOutcome::Stored));
    assert!(matches!(report.chunks[2].outcome, ChunkOutcome::Stored));

    // Chunks 1 and 3 landed despite the chunk 2 failure.
    let contents: Vec<String> = store
        .records()
        .into_iter()
        .map(|record| record.content)
        .collect();
    assert_eq!(contents.len(), 2);
    assert!(contents[0].starts_with('a'));
    assert!(contents[1].starts_with('c'));
}

#[tokio::test]
async fn ingests_from_a_url_with_permissive_status_handling() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/article");
            then.status(404).body(format!(
                "<html><body><p>{}</p>\n\n<p>{}</p></body></html>",
                "a".repeat(60),
                "b".repeat(70)
            ));
        })
        .await;

    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());
    let url = Url::parse(&server.url("/article")).unwrap();
    let report = pipeline.ingest(IngestInput::Url(url)).await.unwrap();

    mock.assert_async().await;
    // The 404 body is still content: two paragraphs, two stored chunks.
    assert_eq!(report.chunks.len(), 2);
    assert_eq!(report.stored(), 2);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn unreachable_urls_abort_the_whole_ingestion() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());

    // Nothing listens on port 1, so the connection is refused.
    let url = Url::parse("http://127.0.0.1:1/").unwrap();
    let err = pipeline.ingest(IngestInput::Url(url)).await.unwrap_err();

    assert!(matches!(err, IngestError::Fetch(_)));
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn long_documents_respect_the_budget_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone())
        .with_chunking_config(ChunkingConfig { max_chars: 250 });

    // One long paragraph of short lowercase sentences.
    let sentence = "this sentence is here to fill out the paragraph with words.";
    let text = std::iter::repeat(sentence)
        .take(20)
        .collect::<Vec<_>>()
        .join(" ");

    let report = pipeline.ingest(IngestInput::Text(text)).await.unwrap();

    assert!(report.chunks.len() > 1);
    for record in store.records() {
        assert!(record.content.chars().count() <= 250);
    }
}
