//! Structured-field extraction: plain text to a loosely structured mapping.
//!
//! This stage is intentionally thin: all prompt wording lives in
//! [`crate::prompts`] so it can change without touching retry or recovery
//! logic here.
//!
//! ## Best-effort contract
//!
//! Small local models routinely ignore "return only JSON": they wrap the
//! object in prose, forget closing braces, or refuse outright. The recovery
//! path (scan to the first `{`, balance-close braces, lenient field pick-up)
//! salvages what it can; when nothing is salvageable the stage returns
//! [`StructuredFields::empty`] rather than failing the request, and the
//! normaliser downstream turns that into an all-placeholder record.
//!
//! ## Retry
//!
//! Exactly one completion call per request, plus at most one same-prompt
//! retry on a transient endpoint failure, enough to ride out a connection
//! blip without letting latency grow unbounded. Auth rejections and elapsed
//! deadlines are never retried.

use crate::error::ExtractError;
use crate::prompts;
use crate::provider::{is_transient, CompletionProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Characters tesseract commonly hallucinates on licence card backgrounds.
static OCR_ARTIFACTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[~^_|`]").expect("static regex"));

/// The loosely structured result of one LLM call: every canonical field
/// optional, unknown keys discarded at construction. This is the only place
/// alias keys (`dob` for `date_of_birth`, …) are understood.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredFields {
    pub document_type: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub license_number: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub address: Option<String>,
}

impl StructuredFields {
    /// A mapping with every field absent. What an unparseable LLM response
    /// degrades to.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lenient construction from any JSON value. Non-object values produce
    /// an empty mapping; scalar field values are coerced to strings; blank
    /// and null values count as absent.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::empty();
        };

        let pick = |aliases: &[&str]| -> Option<String> {
            aliases
                .iter()
                .find_map(|key| obj.get(*key))
                .and_then(coerce_scalar)
        };

        Self {
            document_type: pick(&["document_type", "type"]),
            name: pick(&["name", "full_name"]),
            date_of_birth: pick(&["date_of_birth", "dob"]),
            license_number: pick(&["license_number", "licence_number", "license_no"])
                .map(|s| canonical_license_number(&s)),
            issue_date: pick(&["issue_date", "date_of_issue"]),
            expiry_date: pick(&["expiry_date", "date_of_expiry", "valid_until"]),
            address: pick(&["address"]),
        }
    }
}

/// Runs the single LLM call for one request and recovers a field mapping
/// from whatever comes back.
pub struct FieldExtractor {
    provider: Arc<dyn CompletionProvider>,
    prompt_max_chars: usize,
}

impl FieldExtractor {
    pub fn new(provider: Arc<dyn CompletionProvider>, prompt_max_chars: usize) -> Self {
        Self {
            provider,
            prompt_max_chars,
        }
    }

    /// Clean and bound the raw text, send the extraction prompt, parse the
    /// response. See the module docs for the retry and recovery contracts.
    pub async fn extract_fields(
        &self,
        raw_text: &str,
        deadline: Instant,
    ) -> Result<StructuredFields, ExtractError> {
        let cleaned = clean_text(raw_text);
        let bounded = truncate_chars(&cleaned, self.prompt_max_chars);
        if bounded.len() < cleaned.len() {
            debug!(
                original_chars = cleaned.chars().count(),
                bound = self.prompt_max_chars,
                "raw text truncated for prompt"
            );
        }
        let prompt = prompts::extraction_prompt(&bounded);

        let response = match self.provider.complete(&prompt, deadline).await {
            Ok(r) => r,
            Err(first) if is_transient(&first) && Instant::now() < deadline => {
                warn!(error = %first, "completion failed, retrying once with the same prompt");
                self.provider.complete(&prompt, deadline).await?
            }
            Err(first) => return Err(first),
        };

        Ok(parse_response(&response))
    }
}

/// Strip OCR artifact characters before the text reaches the prompt.
pub fn clean_text(text: &str) -> String {
    OCR_ARTIFACTS.replace_all(text, "").into_owned()
}

/// Take a char-boundary-safe prefix of at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// Parse the model's response into a field mapping; empty on any failure.
pub fn parse_response(response: &str) -> StructuredFields {
    match recover_json(response) {
        Some(value) => StructuredFields::from_value(&value),
        None => {
            let cut = response
                .char_indices()
                .nth(80)
                .map(|(i, _)| i)
                .unwrap_or(response.len());
            warn!(
                response_prefix = &response[..cut],
                "completion response is not parseable JSON, degrading to empty mapping"
            );
            StructuredFields::empty()
        }
    }
}

/// Find a JSON object in free-form model output: everything from the first
/// `{`, with any missing closing braces appended.
fn recover_json(response: &str) -> Option<Value> {
    let start = response.find('{')?;
    let mut candidate = response[start..].trim().to_string();

    let open = candidate.matches('{').count();
    let close = candidate.matches('}').count();
    if open > close {
        candidate.push_str(&"}".repeat(open - close));
    }

    serde_json::from_str(&candidate).ok()
}

/// Licence numbers contain only `A–Z` and digits; strip everything else
/// after upper-casing.
pub fn canonical_license_number(raw: &str) -> String {
    raw.to_ascii_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Coerce a JSON scalar to a trimmed non-empty string.
fn coerce_scalar(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
