#![deny(missing_docs)]

//! Core library for the billscan document-parsing server.

/// Submit → poll orchestration against the document-analysis service.
pub mod analysis;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Downstream collaborators (summarization, speech synthesis).
pub mod downstream;
/// Structured logging and tracing setup.
pub mod logging;
/// Per-request debug trace accumulation.
pub mod trace;
/// Upload resolution: content sniffing, multipart, and base64 decoding.
pub mod upload;
