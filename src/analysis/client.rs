//! HTTP client driving the asynchronous document-analysis service.
//!
//! The service accepts a document via POST, hands back an operation URL in
//! the `Operation-Location` header, and reports progress through that URL
//! until it reaches a terminal status. [`AnalysisClient::analyze`] drives the
//! whole submit → poll cycle:
//!
//! ```text
//! Idle → Submitted → Polling → Succeeded | Failed | TimedOut
//!                  ↘ submit/poll errors surface as `AnalysisError`
//! ```

use reqwest::{Client, StatusCode, header};
use serde_json::Value;

use crate::analysis::types::{AnalysisError, AnalysisOutcome, OperationHandle};
use crate::config::AnalysisConfig;
use crate::trace::DebugTrace;

/// Header carrying the subscription key on every call.
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
/// Cap applied to upstream body previews embedded in errors and traces.
const BODY_PREVIEW_CHARS: usize = 600;

/// Client for one analysis deployment, holding the shared HTTP client and
/// the resolved connection settings.
pub struct AnalysisClient {
    http: Client,
    config: AnalysisConfig,
}

impl AnalysisClient {
    /// Construct a client from a shared HTTP client and resolved settings.
    pub fn new(http: Client, config: AnalysisConfig) -> Self {
        Self { http, config }
    }

    /// Submit a document and poll the resulting operation to completion.
    pub async fn analyze(
        &self,
        bytes: &[u8],
        content_type: &str,
        trace: &mut DebugTrace,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let handle = self.submit(bytes, content_type, trace).await?;
        trace.set_operation_url(handle.as_str());
        self.poll(&handle, trace).await
    }

    /// Submit the document bytes, returning the operation handle.
    ///
    /// The service responds `202 Accepted` for asynchronous models and `200`
    /// for synchronous-style endpoints; both are accepted, and both must
    /// carry an operation-location header.
    pub async fn submit(
        &self,
        bytes: &[u8],
        content_type: &str,
        trace: &mut DebugTrace,
    ) -> Result<OperationHandle, AnalysisError> {
        let url = format!(
            "{}/documentintelligence/documentModels/{}:analyze",
            self.config.endpoint, self.config.model_id
        );
        trace.push(format!(
            "submitting {} bytes as {content_type} to model {}",
            bytes.len(),
            self.config.model_id
        ));

        let response = self
            .http
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header(KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED && status != StatusCode::OK {
            let body = preview(&response.text().await.unwrap_or_default());
            tracing::warn!(%status, "Analysis submit rejected");
            trace.push(format!("submit rejected with {status}"));
            return Err(AnalysisError::Submit { status, body });
        }

        // Header names are matched case-insensitively by the header map.
        let Some(location) = response
            .headers()
            .get("operation-location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
        else {
            tracing::warn!(%status, "Submit response missing operation-location");
            trace.push(format!(
                "submit returned {status} without operation-location"
            ));
            return Err(AnalysisError::MissingOperationLocation);
        };

        trace.push(format!("submit accepted with {status}"));
        Ok(OperationHandle(location))
    }

    /// Poll the operation handle until a terminal status or attempt
    /// exhaustion.
    ///
    /// Each attempt waits `poll_interval` before the GET, so a freshly
    /// submitted operation gets a moment to start. The sleep is the only
    /// suspension point, which lets a dropped connection cancel the loop at
    /// the next await.
    pub async fn poll(
        &self,
        handle: &OperationHandle,
        trace: &mut DebugTrace,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        for attempt in 1..=self.config.poll_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            let response = self
                .http
                .get(handle.as_str())
                .header(KEY_HEADER, &self.config.api_key)
                .send()
                .await?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = preview(&response.text().await.unwrap_or_default());
                tracing::warn!(%status, attempt, "Analysis poll rejected");
                trace.push(format!("poll attempt {attempt} rejected with {status}"));
                return Err(AnalysisError::Poll { status, body });
            }

            let payload: Value = response.json().await?;
            let operation_status = read_status(&payload).unwrap_or_default();
            trace.push(format!(
                "poll attempt {attempt}/{}: status {operation_status}",
                self.config.poll_attempts
            ));

            match operation_status.to_lowercase().as_str() {
                "succeeded" | "partiallysucceeded" => {
                    tracing::info!(attempt, "Analysis succeeded");
                    return Ok(AnalysisOutcome::Succeeded(payload));
                }
                "failed" => {
                    tracing::warn!(attempt, "Analysis failed");
                    return Ok(AnalysisOutcome::Failed(payload));
                }
                // notStarted / running / anything unrecognized: keep polling.
                _ => {}
            }
        }

        tracing::warn!(
            attempts = self.config.poll_attempts,
            "Analysis polling exhausted"
        );
        trace.push("polling budget exhausted without terminal status");
        Ok(AnalysisOutcome::TimedOut)
    }
}

/// Read the operation status from the terminal payload, checking the top
/// level first and the nested `analyzeResult` second.
fn read_status(payload: &Value) -> Option<String> {
    payload
        .get("status")
        .or_else(|| payload.get("analyzeResult").and_then(|r| r.get("status")))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Bound an upstream body before embedding it in errors or traces.
fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
