//! Summarization and structured-field extraction seam.
//!
//! Summaries and field extraction are produced by a separate collaborator
//! with its own contract; this module only pins down that contract and ships
//! a disabled default so the response shape stays stable while the
//! collaborator is absent. Downstream accuracy is explicitly not guaranteed
//! here.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by summarization collaborators.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The collaborator was unable to produce a summary.
    #[error("Summarization failed: {0}")]
    Failed(String),
}

/// One extracted field with the collaborator's confidence in it.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FieldValue {
    /// Extracted value; empty until a collaborator populates it.
    pub value: String,
    /// Confidence in `[0, 1]`; zero until populated.
    pub confidence: f64,
}

/// The fixed five-field structured extraction attached to every success
/// response.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DocumentFields {
    /// Total amount the bill asks for.
    pub amount_due: FieldValue,
    /// Payment due date.
    pub due_date: FieldValue,
    /// Account number on the bill.
    pub account_number: FieldValue,
    /// Issuing organization.
    pub sender: FieldValue,
    /// Service address the bill covers.
    pub service_address: FieldValue,
}

/// Result of one summarization call.
#[derive(Debug, Clone, Default)]
pub struct SummaryOutcome {
    /// English summary of the document text.
    pub summary_en: String,
    /// Summary translated into the requested target language.
    pub summary_translated: String,
    /// Structured field extraction.
    pub fields: DocumentFields,
}

/// Interface implemented by summarization collaborators.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize extracted document text and pull structured fields from it.
    async fn summarize(
        &self,
        text: &str,
        target_lang: &str,
    ) -> Result<SummaryOutcome, SummarizeError>;
}

/// Placeholder collaborator returning empty summaries and zero-confidence
/// fields, keeping the success response shape intact.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(
        &self,
        _text: &str,
        _target_lang: &str,
    ) -> Result<SummaryOutcome, SummarizeError> {
        Ok(SummaryOutcome::default())
    }
}

/// Build the summarizer for the current deployment.
pub fn get_summarizer() -> Box<dyn Summarizer> {
    Box::new(DisabledSummarizer)
}
