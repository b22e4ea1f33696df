//! Error types for the docintel library.
//!
//! Two distinct error types reflect the two sides of the system:
//!
//! * [`ExtractError`]: failures inside the extraction pipeline (server
//!   side). Every internal failure is translated into one of these kinds at
//!   the orchestrator boundary before it crosses the system boundary; no raw
//!   library error or stack trace reaches a caller.
//!
//! * [`ClientError`]: failures observed by the calling side (upload client),
//!   covering transport problems, the client-side timeout, and response
//!   bodies that are not valid JSON.
//!
//! All kinds are terminal for the current request. The only automatic retry
//! anywhere is the single bounded same-prompt retry inside the
//! structured-field stage.

use thiserror::Error;

/// All errors returned by the extraction pipeline.
///
/// Each variant carries a stable machine-readable kind (see
/// [`ExtractError::kind`]) and a human-readable message suitable for showing
/// to an end user.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The declared/sniffed media type is neither PDF nor a supported image.
    #[error("Unsupported file type: '{media_type}'\nSupported: PDF, PNG, JPEG.")]
    UnsupportedMediaType { media_type: String },

    /// OCR or PDF parsing failed on this payload. Deterministic for the same
    /// bytes, so never retried within a request.
    #[error("Text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The completion endpoint could not be reached, timed out, or answered
    /// with an unexpected status, after the single bounded retry.
    #[error("Language model unavailable: {detail}\nCheck that the model endpoint is running and reachable.")]
    LlmUnavailable { detail: String },

    /// The completion endpoint rejected the configured credential (401/403).
    #[error("Language model rejected the credential: {detail}\nCheck the configured API key.")]
    LlmAuthFailure { detail: String },

    // ── Deadline ──────────────────────────────────────────────────────────
    /// The end-to-end request deadline elapsed before the pipeline finished.
    #[error("Processing timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── Policy ────────────────────────────────────────────────────────────
    /// The extracted record is not the expected document type and the
    /// configured policy is [`crate::config::MismatchPolicy::Reject`].
    #[error("Document does not appear to be a {expected} (classified as '{found}')")]
    NotExpectedDocumentType { expected: String, found: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Stable machine-readable kind for logging and status mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::UnsupportedMediaType { .. } => "unsupported_media_type",
            ExtractError::ExtractionFailed { .. } => "extraction_failed",
            ExtractError::LlmUnavailable { .. } => "llm_unavailable",
            ExtractError::LlmAuthFailure { .. } => "llm_auth_failure",
            ExtractError::Timeout { .. } => "timeout",
            ExtractError::NotExpectedDocumentType { .. } => "not_expected_document_type",
            ExtractError::InvalidConfig(_) => "invalid_config",
            ExtractError::Internal(_) => "internal",
        }
    }
}

/// Errors observed by the calling side of the `/analyze` endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The selected file could not be read from disk.
    #[error("Cannot read file '{path}': {detail}")]
    FileUnreadable { path: String, detail: String },

    /// The upload request itself failed (connection refused, DNS, TLS…).
    #[error("Request failed: {detail}")]
    RequestFailed { detail: String },

    /// The client-side wall-clock bound fired and the pending call was
    /// aborted. Independent of the server's own deadline.
    #[error("Processing timed out after {secs}s; the document may be too large or the service overloaded")]
    Timeout { secs: u64 },

    /// The response body was not valid JSON.
    #[error("Invalid server response: {detail}")]
    MalformedServerResponse { detail: String },

    /// The server answered with an error shape (non-2xx or `{ "error": … }`).
    #[error("{message}")]
    ServerError { status: u16, message: String },
}
