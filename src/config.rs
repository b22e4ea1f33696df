//! Configuration for the extraction pipeline.
//!
//! All behaviour is controlled through [`ExtractorConfig`], built via its
//! [`ExtractorConfigBuilder`] or loaded from the environment once at startup
//! with [`ExtractorConfig::from_env`]. The config object is constructed once
//! and passed explicitly into [`crate::extract::Extractor::new`]; pipeline
//! stages never read ambient/global state.

use crate::error::ExtractError;
use crate::provider::CompletionProvider;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What to do when the extracted record is not the expected document type:
/// a non-blocking warning alongside the full (defaulted) record, or a hard
/// rejection of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Return the record with a `type_matches = false` flag; callers render
    /// a warning next to the results. (default)
    #[default]
    Warn,
    /// Fail the request with `NotExpectedDocumentType`.
    Reject,
}

impl FromStr for MismatchPolicy {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(MismatchPolicy::Warn),
            "reject" => Ok(MismatchPolicy::Reject),
            other => Err(ExtractError::InvalidConfig(format!(
                "mismatch policy must be 'warn' or 'reject', got '{other}'"
            ))),
        }
    }
}

/// Configuration for one [`crate::extract::Extractor`].
///
/// # Example
/// ```rust
/// use docintel::ExtractorConfig;
///
/// let config = ExtractorConfig::builder()
///     .llm_model("llama3")
///     .request_budget_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractorConfig {
    /// Completion endpoint URL (Ollama-style `/api/generate`).
    /// Default: `http://localhost:11434/api/generate`.
    pub llm_endpoint: String,

    /// Model identifier sent with every completion request. Default: `llama3`.
    pub llm_model: String,

    /// Optional bearer credential for hosted completion endpoints. Read from
    /// process-wide configuration at startup; local Ollama needs none.
    pub llm_api_key: Option<String>,

    /// Pre-constructed completion provider. Takes precedence over
    /// `llm_endpoint`/`llm_model`; the seam used by tests to inject mocks.
    pub provider: Option<Arc<dyn CompletionProvider>>,

    /// Token matched (case-insensitive substring) against the extracted
    /// `document_type` to classify the document. Default: `driving`.
    pub expected_type_token: String,

    /// Behaviour on a non-matching document type. Default: [`MismatchPolicy::Warn`].
    pub mismatch_policy: MismatchPolicy,

    /// End-to-end wall-clock budget per request in seconds, spanning text
    /// extraction, the LLM call and normalisation combined. Default: 60.
    pub request_budget_secs: u64,

    /// Upper bound on the raw-text prefix embedded in the LLM prompt, in
    /// characters. Default: 8000, roughly 2k tokens, which fits the
    /// practical context budget of small local models. Deliberately
    /// independent of
    /// `preview_max_chars`: the prompt bound protects model latency, the
    /// preview bound protects response size.
    pub prompt_max_chars: usize,

    /// Upper bound on the `raw_text_preview` returned to callers, in
    /// characters. Default: 500.
    pub preview_max_chars: usize,

    /// Tesseract language code for image OCR. Default: `eng`.
    pub ocr_language: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: "http://localhost:11434/api/generate".to_string(),
            llm_model: "llama3".to_string(),
            llm_api_key: None,
            provider: None,
            expected_type_token: "driving".to_string(),
            mismatch_policy: MismatchPolicy::default(),
            request_budget_secs: 60,
            prompt_max_chars: 8000,
            preview_max_chars: 500,
            ocr_language: "eng".to_string(),
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("llm_endpoint", &self.llm_endpoint)
            .field("llm_model", &self.llm_model)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider.as_ref().map(|_| "<dyn CompletionProvider>"))
            .field("expected_type_token", &self.expected_type_token)
            .field("mismatch_policy", &self.mismatch_policy)
            .field("request_budget_secs", &self.request_budget_secs)
            .field("prompt_max_chars", &self.prompt_max_chars)
            .field("preview_max_chars", &self.preview_max_chars)
            .field("ocr_language", &self.ocr_language)
            .finish()
    }
}

impl ExtractorConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from `DOCINTEL_*` environment variables, with the
    /// same defaults as [`ExtractorConfig::default`]. Unset variables fall
    /// back to defaults; malformed numeric/enum values are errors.
    pub fn from_env() -> Result<Self, ExtractError> {
        let mut builder = Self::builder();

        if let Ok(v) = std::env::var("DOCINTEL_LLM_ENDPOINT") {
            builder = builder.llm_endpoint(v);
        }
        if let Ok(v) = std::env::var("DOCINTEL_LLM_MODEL") {
            builder = builder.llm_model(v);
        }
        if let Ok(v) = std::env::var("DOCINTEL_LLM_API_KEY") {
            if !v.is_empty() {
                builder = builder.llm_api_key(v);
            }
        }
        if let Ok(v) = std::env::var("DOCINTEL_EXPECTED_TYPE") {
            builder = builder.expected_type_token(v);
        }
        if let Ok(v) = std::env::var("DOCINTEL_MISMATCH_POLICY") {
            builder = builder.mismatch_policy(v.parse()?);
        }
        if let Ok(v) = std::env::var("DOCINTEL_REQUEST_BUDGET_SECS") {
            let secs = v.parse::<u64>().map_err(|_| {
                ExtractError::InvalidConfig(format!(
                    "DOCINTEL_REQUEST_BUDGET_SECS must be an integer, got '{v}'"
                ))
            })?;
            builder = builder.request_budget_secs(secs);
        }
        if let Ok(v) = std::env::var("DOCINTEL_OCR_LANGUAGE") {
            builder = builder.ocr_language(v);
        }

        builder.build()
    }
}

/// Builder for [`ExtractorConfig`].
#[derive(Debug)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn llm_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.llm_endpoint = url.into();
        self
    }

    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.config.llm_model = model.into();
        self
    }

    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm_api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn expected_type_token(mut self, token: impl Into<String>) -> Self {
        self.config.expected_type_token = token.into();
        self
    }

    pub fn mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.config.mismatch_policy = policy;
        self
    }

    pub fn request_budget_secs(mut self, secs: u64) -> Self {
        self.config.request_budget_secs = secs.max(1);
        self
    }

    pub fn prompt_max_chars(mut self, chars: usize) -> Self {
        self.config.prompt_max_chars = chars.max(100);
        self
    }

    pub fn preview_max_chars(mut self, chars: usize) -> Self {
        self.config.preview_max_chars = chars;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractorConfig, ExtractError> {
        let c = &self.config;
        if c.llm_endpoint.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "LLM endpoint must not be empty".into(),
            ));
        }
        if c.llm_model.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "LLM model must not be empty".into(),
            ));
        }
        if c.expected_type_token.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "expected type token must not be empty".into(),
            ));
        }
        if c.ocr_language.is_empty()
            || !c.ocr_language.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '+')
        {
            return Err(ExtractError::InvalidConfig(format!(
                "OCR language must be a tesseract language code, got '{}'",
                c.ocr_language
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let c = ExtractorConfig::default();
        assert_eq!(c.request_budget_secs, 60);
        assert_eq!(c.prompt_max_chars, 8000);
        assert_eq!(c.preview_max_chars, 500);
        assert_eq!(c.expected_type_token, "driving");
        assert_eq!(c.mismatch_policy, MismatchPolicy::Warn);
    }

    #[test]
    fn builder_clamps_budget_to_one_second() {
        let c = ExtractorConfig::builder()
            .request_budget_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.request_budget_secs, 1);
    }

    #[test]
    fn empty_endpoint_rejected() {
        let err = ExtractorConfig::builder().llm_endpoint("").build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn shell_metacharacters_rejected_in_ocr_language() {
        let err = ExtractorConfig::builder().ocr_language("eng; rm -rf /").build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn mismatch_policy_parses() {
        assert_eq!(MismatchPolicy::from_str("warn").unwrap(), MismatchPolicy::Warn);
        assert_eq!(MismatchPolicy::from_str(" Reject ").unwrap(), MismatchPolicy::Reject);
        assert!(MismatchPolicy::from_str("maybe").is_err());
    }
}
