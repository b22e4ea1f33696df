//! # docintel
//!
//! Document intelligence pipeline: turn a single uploaded image or PDF
//! into a normalized, structured record.
//!
//! ```text
//! upload (image / PDF)
//!        │
//!        ▼
//! ┌──────────────┐    ┌───────────────┐    ┌──────────────┐
//! │ text capture │ ─▶ │ LLM structured │ ─▶ │ normalization │
//! │ (OCR / PDF)  │    │ extraction     │    │ (canonical    │
//! └──────────────┘    └───────────────┘    │  record)      │
//!                                          └──────────────┘
//! ```
//!
//! The pipeline is tolerant by design: a model that returns prose instead
//! of JSON, or JSON missing half its fields, still yields a complete
//! placeholder-filled [`LicenseRecord`] rather than an error. Hard errors
//! are reserved for inputs that cannot be processed at all (unreadable
//! files, unsupported media types, an unreachable model endpoint, or the
//! per-request deadline expiring).
//!
//! ## Quick start
//!
//! ```no_run
//! use docintel::{ExtractorConfig, Extractor, ExtractionRequest, UploadedDocument};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), docintel::ExtractError> {
//! let config = ExtractorConfig::builder()
//!     .llm_model("llama3")
//!     .build()?;
//! let extractor = Extractor::new(config);
//!
//! let bytes = std::fs::read("license.pdf")
//!     .map_err(|e| docintel::ExtractError::Internal(e.to_string()))?;
//! let doc = UploadedDocument::new(bytes, Some("application/pdf"), "license.pdf");
//! let request = ExtractionRequest::new(doc, Duration::from_secs(60));
//!
//! let extraction = extractor.run(request).await?;
//! println!("{}", extraction.record.name);
//! # Ok(())
//! # }
//! ```
//!
//! ## Serving over HTTP
//!
//! [`server::serve`] exposes the same pipeline as `POST /analyze`
//! (multipart, single `file` field) plus `GET /health`, and
//! [`client::AnalyzeClient`] is the matching caller with a
//! [`StageTracker`]-driven progress surface.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod server;

pub use client::AnalyzeClient;
pub use config::{ExtractorConfig, ExtractorConfigBuilder, MismatchPolicy};
pub use document::{ExtractionRequest, MediaType, UploadedDocument};
pub use error::{ClientError, ExtractError};
pub use extract::{Extraction, Extractor};
pub use pipeline::fields::StructuredFields;
pub use pipeline::normalize::{normalize, LicenseRecord, PLACEHOLDER};
pub use pipeline::text::{DefaultTextExtractor, TextExtractor};
pub use progress::{ProcessingStage, StageObserver, StageTracker};
pub use provider::{CompletionProvider, OllamaProvider};
