//! chunkwright-server: HTTP ingestion endpoint backed by OpenAI embeddings
//! and a sqlite-vec store.

use std::sync::Arc;

use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chunkwright::embeddings::{DEFAULT_DIMENSIONS, DEFAULT_MODEL, OpenAiEmbeddingProvider};
use chunkwright::pipeline::IngestPipeline;
use chunkwright::server;
use chunkwright::stores::SqliteEmbeddingStore;

#[derive(Clone, Debug)]
struct ServerConfig {
    bind: String,
    db_path: String,
    openai_api_key: String,
    openai_base_url: String,
    openai_model: String,
    dimensions: usize,
}

impl ServerConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let openai_api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY is not set")?;
        let dimensions = match std::env::var("CHUNKWRIGHT_EMBED_DIMENSIONS") {
            Ok(raw) => raw.parse::<usize>()?,
            Err(_) => DEFAULT_DIMENSIONS,
        };

        Ok(Self {
            bind: std::env::var("CHUNKWRIGHT_BIND")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            db_path: std::env::var("CHUNKWRIGHT_DB")
                .unwrap_or_else(|_| "chunkwright.sqlite".to_string()),
            openai_api_key,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: std::env::var("OPENAI_EMBED_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            dimensions,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let client = Client::builder()
        .user_agent(concat!("chunkwright/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()?;

    let provider = Arc::new(OpenAiEmbeddingProvider::new(
        client.clone(),
        &config.openai_base_url,
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.dimensions,
    ));
    let store = Arc::new(SqliteEmbeddingStore::open(&config.db_path, config.dimensions).await?);
    let pipeline = Arc::new(IngestPipeline::new(client, provider, store));

    let listener = TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, db = %config.db_path, model = %config.openai_model, "listening");
    axum::serve(listener, server::router(pipeline)).await?;
    Ok(())
}
