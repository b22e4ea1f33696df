//! Prompt templates for structured-field extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: changing the field list or an extraction
//!    rule requires editing exactly one place.
//!
//! 2. **Testability**: unit tests can inspect the built prompt without
//!    calling a real model, making prompt regressions easy to catch.

/// Instruction block placed before the document text in every extraction
/// prompt. The model is told to answer with bare JSON so the response can be
/// parsed mechanically; the recovery path in
/// [`crate::pipeline::fields`] handles models that ignore this anyway.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You are an AI system extracting Driving License fields.

RETURN ONLY VALID JSON.
NO markdown.
NO explanation.
NO code block.

Fields required:
document_type
name
date_of_birth
license_number
issue_date
expiry_date
address

Rules:
- Remove OCR artifacts
- License number only A-Z and digits
- Dates format DD-MM-YYYY
- Always output valid JSON"#;

/// Build the full extraction prompt embedding the (already truncated)
/// document text verbatim.
pub fn extraction_prompt(text: &str) -> String {
    format!("{EXTRACTION_INSTRUCTIONS}\n\nTEXT:\n{text}\n")
}
