//! The extraction orchestrator: one request in, one canonical record out.
//!
//! [`Extractor::run`] drives the pipeline stages strictly in order under a
//! single end-to-end deadline. Each [`Extractor`] is cheaply cloneable and holds no
//! per-request state, so concurrent requests need no locking; every
//! intermediate value is owned by the call and dropped when it returns.
//!
//! ## Deadline semantics
//!
//! The deadline is enforced at both suspension points. The LLM call is
//! cancelled outright (the provider bounds its network timeout by the
//! deadline). OCR/PDF parsing runs in a blocking task that cannot be cheaply
//! interrupted; `timeout_at` abandons it and returns [`ExtractError::Timeout`]
//! within the grace window while the task finishes in the background; its
//! temp artifacts are cleaned up by their own scope either way.

use crate::config::{ExtractorConfig, MismatchPolicy};
use crate::document::{ExtractionRequest, MediaType};
use crate::error::ExtractError;
use crate::pipeline::fields::FieldExtractor;
use crate::pipeline::normalize::{self, LicenseRecord};
use crate::pipeline::text::{DefaultTextExtractor, TextExtractor};
use crate::provider::{CompletionProvider, OllamaProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The all-or-nothing result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Fully populated canonical record (placeholders, never gaps).
    pub record: LicenseRecord,
    /// Whether `document_type` matched the configured expected-type token.
    /// `false` is a warning for callers, not an error, unless the mismatch
    /// policy is `Reject`, in which case `run` fails instead.
    pub type_matches: bool,
    /// Bounded prefix of the raw text for display. The bound is
    /// `preview_max_chars`, independent of the LLM prompt truncation.
    pub preview: String,
}

/// Coordinates the pipeline for single requests.
#[derive(Clone)]
pub struct Extractor {
    config: ExtractorConfig,
    text_extractor: Arc<dyn TextExtractor>,
    provider: Arc<dyn CompletionProvider>,
}

impl Extractor {
    /// Build an extractor from config. The completion provider resolves from
    /// most-specific to least-specific: a pre-built `config.provider` wins
    /// (the seam tests use), otherwise an [`OllamaProvider`] is constructed
    /// for `config.llm_endpoint`.
    pub fn new(config: ExtractorConfig) -> Self {
        let provider: Arc<dyn CompletionProvider> = match config.provider {
            Some(ref p) => Arc::clone(p),
            None => Arc::new(OllamaProvider::new(
                config.llm_endpoint.clone(),
                config.llm_model.clone(),
                config.llm_api_key.clone(),
            )),
        };
        let text_extractor: Arc<dyn TextExtractor> =
            Arc::new(DefaultTextExtractor::new(config.ocr_language.clone()));
        Self {
            config,
            text_extractor,
            provider,
        }
    }

    /// Build with an explicit text extractor, for callers (and tests) that
    /// substitute the OCR/PDF collaborator at its interface boundary.
    pub fn with_text_extractor(
        config: ExtractorConfig,
        text_extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let mut extractor = Self::new(config);
        extractor.text_extractor = text_extractor;
        extractor
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run the full pipeline for one request.
    ///
    /// All-or-nothing: any stage failure (or the deadline) fails the request
    /// with a single translated [`ExtractError`]; no partial result escapes.
    pub async fn run(&self, request: ExtractionRequest) -> Result<Extraction, ExtractError> {
        let start = Instant::now();
        let deadline = request.deadline;
        let budget_secs = deadline
            .saturating_duration_since(start)
            .as_secs()
            .max(1);
        let document = request.document;
        info!(
            name = %document.original_name,
            media_type = %document.media_type,
            bytes = document.bytes.len(),
            "processing document"
        );

        // Rejected here rather than inside the text stage so the message
        // names what the caller sent, not the resolved `unknown`.
        if document.media_type == MediaType::Unknown {
            return Err(ExtractError::UnsupportedMediaType {
                media_type: document.type_label(),
            });
        }

        // ── Stage 1: text extraction ─────────────────────────────────────
        let raw_text = self
            .bounded(
                deadline,
                budget_secs,
                self.text_extractor
                    .extract(&document.bytes, document.media_type, deadline),
            )
            .await??;
        debug!(
            chars = raw_text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "text extraction complete"
        );
        if raw_text.trim().is_empty() {
            warn!("no readable text in document; downstream fields will default");
        }

        // ── Stage 2: structured-field extraction ─────────────────────────
        let field_extractor =
            FieldExtractor::new(Arc::clone(&self.provider), self.config.prompt_max_chars);
        let fields = self
            .bounded(
                deadline,
                budget_secs,
                field_extractor.extract_fields(&raw_text, deadline),
            )
            .await??;

        // ── Stage 3: normalisation + classification ──────────────────────
        let record = normalize::normalize(&fields);
        let type_matches =
            normalize::matches_expected_type(&record, &self.config.expected_type_token);

        if !type_matches {
            match self.config.mismatch_policy {
                MismatchPolicy::Warn => {
                    warn!(
                        found = %record.document_type,
                        expected = %self.config.expected_type_token,
                        "document type does not match expected type"
                    );
                }
                MismatchPolicy::Reject => {
                    return Err(ExtractError::NotExpectedDocumentType {
                        expected: self.config.expected_type_token.clone(),
                        found: record.document_type,
                    });
                }
            }
        }

        let preview = char_prefix(&raw_text, self.config.preview_max_chars);
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            type_matches, "extraction complete"
        );

        Ok(Extraction {
            record,
            type_matches,
            preview,
        })
        // document, raw_text and fields drop here; nothing survives the request
    }

    /// Wrap a stage future with the end-to-end deadline.
    async fn bounded<T>(
        &self,
        deadline: Instant,
        budget_secs: u64,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, ExtractError> {
        tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), fut)
            .await
            .map_err(|_| ExtractError::Timeout { secs: budget_secs })
    }
}

/// Char-boundary-safe prefix of at most `max` characters.
fn char_prefix(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
