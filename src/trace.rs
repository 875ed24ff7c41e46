//! Per-request debug trace.
//!
//! Each request accumulates an ordered list of human-readable step strings as
//! it moves through upload resolution and analysis. The trace is scoped to a
//! single request and is only serialized into responses when the
//! `verbose_debug` configuration flag is enabled, since it carries internal
//! operational detail (operation URLs, upstream body previews).

use serde::Serialize;

/// Append-only step log for one request.
#[derive(Debug, Default)]
pub struct DebugTrace {
    steps: Vec<String>,
    operation_url: Option<String>,
}

impl DebugTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step description.
    pub fn push(&mut self, step: impl Into<String>) {
        let step = step.into();
        tracing::debug!(step = %step, "trace");
        self.steps.push(step);
    }

    /// Record the operation URL returned by the analysis submission.
    pub fn set_operation_url(&mut self, url: impl Into<String>) {
        self.operation_url = Some(url.into());
    }

    /// Steps recorded so far, in order.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Convert into the wire representation attached to responses.
    pub fn into_report(self) -> DebugReport {
        DebugReport {
            steps: self.steps,
            operation_url: self.operation_url,
        }
    }
}

/// Wire shape of the `debug` object in responses.
#[derive(Debug, Serialize)]
pub struct DebugReport {
    /// Ordered step descriptions recorded during the request.
    pub steps: Vec<String>,
    /// Operation URL issued by the analysis service, when one was obtained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_url: Option<String>,
}
