//! HTTP surface: the ingestion endpoint and a health check.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;
use url::Url;

use crate::pipeline::{IngestInput, IngestPipeline, IngestReport};
use crate::types::IngestError;

/// Request body: exactly one of `text` or `url` must be present.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: IngestReport,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Builds the application router. Preflight requests are answered with a
/// permissive CORS policy, matching the original deployment.
pub fn router(pipeline: Arc<IngestPipeline>) -> Router {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(pipeline)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ingest(
    State(pipeline): State<Arc<IngestPipeline>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let input = parse_input(request).map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
    })?;

    match pipeline.ingest(input).await {
        Ok(report) => Ok(Json(IngestResponse {
            status: "ok",
            report,
        })),
        Err(err) => {
            error!(error = %err, "ingestion failed");
            let status = match &err {
                IngestError::Fetch(_) => StatusCode::BAD_GATEWAY,
                IngestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            ))
        }
    }
}

fn parse_input(request: IngestRequest) -> Result<IngestInput, IngestError> {
    match (request.text, request.url) {
        (Some(_), Some(_)) => Err(IngestError::InvalidRequest(
            "provide either `text` or `url`, not both".into(),
        )),
        (None, None) => Err(IngestError::InvalidRequest(
            "provide one of `text` or `url`".into(),
        )),
        (Some(text), None) => Ok(IngestInput::Text(text)),
        (None, Some(url)) => {
            let url = Url::parse(&url)
                .map_err(|err| IngestError::InvalidRequest(format!("invalid url: {err}")))?;
            Ok(IngestInput::Url(url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_both_text_and_url() {
        let request = IngestRequest {
            text: Some("body".into()),
            url: Some("https://example.com".into()),
        };
        assert!(matches!(
            parse_input(request),
            Err(IngestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_neither_text_nor_url() {
        let request = IngestRequest {
            text: None,
            url: None,
        };
        assert!(matches!(
            parse_input(request),
            Err(IngestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_unparseable_urls() {
        let request = IngestRequest {
            text: None,
            url: Some("not a url".into()),
        };
        assert!(matches!(
            parse_input(request),
            Err(IngestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn accepts_plain_text() {
        let request = IngestRequest {
            text: Some("body".into()),
            url: None,
        };
        assert!(matches!(parse_input(request), Ok(IngestInput::Text(_))));
    }
}
