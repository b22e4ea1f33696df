//! HTTP ingress: one multipart upload endpoint plus a health check.
//!
//! `POST /analyze` accepts a single file field, runs the extraction
//! pipeline, and answers with either the canonical record or a single
//! user-facing error string. Error messages come from the
//! [`ExtractError`](crate::error::ExtractError) taxonomy only; nothing
//! internal (stack traces, library messages) crosses this boundary.

use crate::document::{ExtractionRequest, UploadedDocument};
use crate::error::ExtractError;
use crate::extract::{Extraction, Extractor};
use crate::pipeline::normalize::LicenseRecord;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Uploads above this size are rejected before extraction starts.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Success shape of `POST /analyze`. `Deserialize` is derived so the
/// bundled [`client`](crate::client) reads the same wire shape the server
/// writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub extracted_data: LicenseRecord,
    pub raw_text_preview: String,
    /// Present when the document type did not match the expected type and
    /// the mismatch policy is `Warn`. A warning, never an error: the full
    /// (defaulted) record is still returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Error shape of `POST /analyze`, always paired with a non-2xx status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Build the application router.
pub fn router(extractor: Extractor) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(extractor)
}

/// Bind and serve until the process is stopped.
pub async fn serve(extractor: Extractor, addr: SocketAddr) -> Result<(), ExtractError> {
    let app = router(extractor);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ExtractError::Internal(format!("cannot bind {addr}: {e}")))?;
    info!("listening on {addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| ExtractError::Internal(format!("server error: {e}")))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn analyze(
    State(extractor): State<Extractor>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let document = read_upload(multipart).await.map_err(|msg| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: msg }),
        )
    })?;

    let budget = Duration::from_secs(extractor.config().request_budget_secs);
    let request = ExtractionRequest::new(document, budget);

    match extractor.run(request).await {
        Ok(extraction) => Ok(Json(success_body(&extractor, extraction))),
        Err(err) => {
            error!(kind = err.kind(), error = %err, "extraction failed");
            Err((
                status_for(&err),
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            ))
        }
    }
}

/// Pull the first `file` field out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedDocument, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed upload: {e}"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("Failed to read upload: {e}"))?;
        if bytes.is_empty() {
            return Err("Uploaded file is empty".to_string());
        }
        return Ok(UploadedDocument::new(
            bytes.to_vec(),
            declared_type.as_deref(),
            original_name,
        ));
    }
    Err("Missing 'file' field in multipart upload".to_string())
}

fn success_body(extractor: &Extractor, extraction: Extraction) -> AnalyzeResponse {
    let warning = if extraction.type_matches {
        None
    } else {
        Some(format!(
            "This document does not appear to match the expected type '{}'",
            extractor.config().expected_type_token
        ))
    };
    AnalyzeResponse {
        extracted_data: extraction.record,
        raw_text_preview: extraction.preview,
        warning,
    }
}

/// Stable status per error kind. Auth failures toward the LLM endpoint are a
/// *gateway* problem from the caller's point of view, hence 502 rather than
/// leaking a misleading 401.
fn status_for(err: &ExtractError) -> StatusCode {
    match err {
        ExtractError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ExtractError::ExtractionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ExtractError::NotExpectedDocumentType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ExtractError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ExtractError::LlmUnavailable { .. } | ExtractError::LlmAuthFailure { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ExtractError::InvalidConfig(_) | ExtractError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
