//! Calling side of the `/analyze` endpoint.
//!
//! Wraps the multipart upload, the fixed wall-clock timeout, and the
//! defensive decode of the response body, driving a [`StageTracker`] so
//! front-ends (the bundled CLI included) can render progress without
//! touching HTTP details.

use crate::error::ClientError;
use crate::progress::StageTracker;
use crate::server::{AnalyzeResponse, ErrorResponse};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default client-side bound, matched to the server's default budget so
/// the caller never gives up before the server would have.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 60;

/// Thin client for a running analyze service.
#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl AnalyzeClient {
    /// `base_url` is the service root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_CLIENT_TIMEOUT_SECS,
        }
    }

    /// Override the wall-clock bound for the whole call (minimum 1s).
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    /// Upload `path` and wait for the structured result, reporting
    /// transitions through `tracker`.
    ///
    /// On any failure `tracker` lands in `Failed` with the same message the
    /// returned error carries; on success it lands in `Complete`.
    pub async fn analyze_file(
        &self,
        path: &Path,
        tracker: &mut StageTracker,
    ) -> Result<AnalyzeResponse, ClientError> {
        tracker.begin_upload();
        let outcome = self.analyze_inner(path, tracker).await;
        match &outcome {
            Ok(_) => {
                // extracting → analyzing → complete; the server reports no
                // substage boundaries so the tail transitions fire here.
                while !tracker.stage().is_terminal() && tracker.advance() {}
            }
            Err(err) => {
                tracker.fail(err.to_string());
            }
        }
        outcome
    }

    async fn analyze_inner(
        &self,
        path: &Path,
        tracker: &mut StageTracker,
    ) -> Result<AnalyzeResponse, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ClientError::FileUnreadable {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        debug!(file = %file_name, size = bytes.len(), "uploading document");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.as_ref())
            .map_err(|e| ClientError::RequestFailed { detail: e.to_string() })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout { secs: self.timeout_secs }
                } else {
                    ClientError::RequestFailed { detail: e.to_string() }
                }
            })?;

        // upload done, server is now extracting
        tracker.advance();

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout { secs: self.timeout_secs }
            } else {
                ClientError::RequestFailed { detail: e.to_string() }
            }
        })?;

        if !status.is_success() {
            // The error body shape is `{ "error": … }`; anything else is
            // reported with the raw status only.
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("Server returned status {status}"));
            return Err(ClientError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<AnalyzeResponse>(&body).map_err(|e| {
            ClientError::MalformedServerResponse { detail: e.to_string() }
        })
    }
}
