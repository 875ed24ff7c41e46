//! Asynchronous document-analysis orchestration: submit, poll, extract.

mod client;
pub mod extract;
pub mod types;

pub use client::AnalysisClient;
pub use types::{AnalysisError, AnalysisOutcome, OperationHandle};
