//! The completion-provider seam: one prompt in, free-form text out.
//!
//! The pipeline talks to the language model exclusively through
//! [`CompletionProvider`], so tests inject a mock and production wires up
//! [`OllamaProvider`] against a local or remote Ollama-style endpoint.
//! Deadline awareness lives here because the network call is the one
//! suspension point that must be cancelled when the request budget runs out.

use crate::error::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// A black-box text-completion function.
///
/// Implementations must abort the underlying call when `deadline` passes;
/// the orchestrator still enforces its own overall timeout as a backstop.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one prompt, return the model's raw text response.
    async fn complete(&self, prompt: &str, deadline: Instant) -> Result<String, ExtractError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama-style HTTP completion provider (`POST /api/generate`).
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OllamaProvider {
    /// Build a provider for the given endpoint/model, with an optional
    /// bearer credential for hosted deployments.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, prompt: &str, deadline: Instant) -> Result<String, ExtractError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ExtractError::Timeout { secs: 0 });
        }

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_chars = prompt.len(),
            budget_ms = remaining.as_millis() as u64,
            "sending completion request"
        );

        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            // Per-request timeout bounded by the deadline: reqwest aborts the
            // connection when it fires, satisfying the cancellation contract.
            .timeout(remaining)
            .json(&body);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::Timeout {
                    secs: remaining.as_secs(),
                }
            } else {
                ExtractError::LlmUnavailable {
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ExtractError::LlmAuthFailure {
                detail: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            return Err(ExtractError::LlmUnavailable {
                detail: format!("HTTP {status}"),
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ExtractError::LlmUnavailable {
                    detail: format!("malformed completion response: {e}"),
                })?;

        Ok(parsed.response)
    }
}

/// `true` when a provider error is worth the single same-prompt retry.
/// Auth rejections and elapsed deadlines never are.
pub fn is_transient(err: &ExtractError) -> bool {
    matches!(err, ExtractError::LlmUnavailable { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(is_transient(&ExtractError::LlmUnavailable {
            detail: "HTTP 503".into()
        }));
        assert!(!is_transient(&ExtractError::LlmAuthFailure {
            detail: "HTTP 401".into()
        }));
        assert!(!is_transient(&ExtractError::Timeout { secs: 5 }));
    }

    #[tokio::test]
    async fn elapsed_deadline_short_circuits() {
        let provider = OllamaProvider::new("http://localhost:11434/api/generate", "llama3", None);
        let past = Instant::now() - Duration::from_secs(1);
        let err = provider.complete("hi", past).await.unwrap_err();
        assert!(matches!(err, ExtractError::Timeout { .. }));
    }

    #[test]
    fn request_body_serialises_without_stream() {
        let body = GenerateRequest {
            model: "llama3",
            prompt: "p",
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], false);
    }
}
