//! External collaborators fed by the extracted text.
//!
//! These are request/response services with their own contracts; the core
//! pipeline treats them as opaque.

pub mod speech;
pub mod summarize;

pub use speech::{SpeechClient, SpeechError};
pub use summarize::{DocumentFields, SummarizeError, Summarizer, get_summarizer};
