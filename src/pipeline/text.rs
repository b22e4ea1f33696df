//! Text extraction: raw document bytes to plain text.
//!
//! Two variants sit behind the [`TextExtractor`] trait: the PDF path reads
//! the embedded text layer in memory, the image path shells out to the
//! `tesseract` CLI. OCR input is written to a request-owned [`TempDir`]
//! whose `Drop` removes the artifact on every exit path, so concurrent
//! requests never share a temp-file namespace and nothing is left behind on
//! failure or panic.
//!
//! Both paths are deterministic for a given payload: a corrupt PDF or an
//! OCR engine error fails the request without retry. An *empty* result is
//! not a failure: a scanned, image-only PDF legitimately has no text layer,
//! and low-confidence OCR output is still output.

use crate::document::MediaType;
use crate::error::ExtractError;
use async_trait::async_trait;
use std::process::Command;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Turns document bytes of a known media type into plain text.
///
/// `deadline` is advisory here: OCR cannot be cheaply cancelled mid-run, so
/// the orchestrator enforces the overall budget around this call and lets a
/// late blocking task finish in the background.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(
        &self,
        bytes: &[u8],
        media_type: MediaType,
        deadline: Instant,
    ) -> Result<String, ExtractError>;
}

/// Production extractor: `pdf-extract` for PDFs, tesseract CLI for images.
pub struct DefaultTextExtractor {
    ocr_language: String,
}

impl DefaultTextExtractor {
    pub fn new(ocr_language: impl Into<String>) -> Self {
        Self {
            ocr_language: ocr_language.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for DefaultTextExtractor {
    async fn extract(
        &self,
        bytes: &[u8],
        media_type: MediaType,
        deadline: Instant,
    ) -> Result<String, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::ExtractionFailed {
                detail: "empty payload".into(),
            });
        }
        if deadline.saturating_duration_since(Instant::now()).is_zero() {
            return Err(ExtractError::Timeout { secs: 0 });
        }

        match media_type {
            MediaType::Pdf => extract_pdf_text(bytes.to_vec()).await,
            MediaType::Image => extract_image_text(bytes.to_vec(), self.ocr_language.clone()).await,
            MediaType::Unknown => Err(ExtractError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            }),
        }
    }
}

/// Parse the embedded text layer of a PDF.
///
/// Runs under `spawn_blocking` because pdf-extract is CPU-bound and not
/// async-aware. Empty output is returned as-is.
async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractError::Internal(format!("PDF parse task failed: {e}")))?
        .map_err(|e| ExtractError::ExtractionFailed {
            detail: format!("cannot parse PDF: {e}"),
        })?;

    if text.trim().is_empty() {
        warn!("PDF has no embedded text layer (scanned document?)");
    } else {
        debug!(chars = text.len(), "extracted PDF text layer");
    }
    Ok(text)
}

/// Run tesseract over an image payload.
///
/// The image is written into a fresh `TempDir`; the directory (and the
/// artifact inside it) is removed when the closure returns, success or not.
async fn extract_image_text(bytes: Vec<u8>, language: String) -> Result<String, ExtractError> {
    let text = tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
        let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(format!("tempdir: {e}")))?;
        let image_path = temp_dir.path().join("input.png");
        std::fs::write(&image_path, &bytes)
            .map_err(|e| ExtractError::Internal(format!("temp image write: {e}")))?;

        let output = Command::new("tesseract")
            .arg(&image_path)
            .arg("stdout")
            .args(["-l", &language])
            .output()
            .map_err(|e| ExtractError::ExtractionFailed {
                detail: format!(
                    "cannot run tesseract: {e}\nInstall with: apt install tesseract-ocr"
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::ExtractionFailed {
                detail: format!("tesseract error: {}", stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        // temp_dir dropped here: artifact removed on every path
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("OCR task failed: {e}")))??;

    debug!(chars = text.len(), "OCR finished");
    Ok(text)
}
