//! Shared types for the analysis client.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Opaque URL identifying one in-flight analysis operation.
///
/// Issued by the submission call via the `Operation-Location` response header
/// and polled until a terminal status; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(
    /// Operation URL to poll.
    pub String,
);

impl OperationHandle {
    /// The operation URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Terminal outcome of a submit → poll cycle.
///
/// All three variants are ordinary results the caller maps to a response;
/// only [`AnalysisError`] values describe protocol-level failures.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// The service reported `succeeded` (or `partiallySucceeded`); the
    /// terminal payload carries extractable text.
    Succeeded(Value),
    /// The service reported `failed`; the payload is kept for diagnostics.
    Failed(Value),
    /// Every poll attempt was exhausted without reaching a terminal status.
    TimedOut,
}

/// Protocol-level failures while talking to the analysis service.
///
/// None of these abort the process; the request handler converts them into a
/// structured failure response.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// HTTP layer failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Submission returned a status other than 200/202.
    #[error("Unexpected submit response ({status}): {body}")]
    Submit {
        /// HTTP status returned by the submit call.
        status: StatusCode,
        /// Body preview associated with the failing response.
        body: String,
    },
    /// Submission was accepted but carried no operation-location header.
    #[error("Submit response missing Operation-Location header")]
    MissingOperationLocation,
    /// A poll returned a status other than 200.
    #[error("Unexpected poll response ({status}): {body}")]
    Poll {
        /// HTTP status returned by the poll call.
        status: StatusCode,
        /// Body preview associated with the failing response.
        body: String,
    },
}
