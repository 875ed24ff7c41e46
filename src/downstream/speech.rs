//! Speech-synthesis collaborator.
//!
//! Wraps the hosted text-to-speech endpoint: text goes in as SSML with a
//! subscription key, mp3 bytes come back. Voice and language default to a
//! Spanish/English pair matching the front-end's audience.

use reqwest::Client;
use thiserror::Error;

use crate::config::SpeechConfig;

/// Output format requested from the synthesis service.
const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Errors raised while synthesizing speech.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// HTTP layer failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The synthesis service rejected the request.
    #[error("Speech synthesis failed ({status}): {detail}")]
    Upstream {
        /// HTTP status returned by the service.
        status: reqwest::StatusCode,
        /// Body associated with the failing response.
        detail: String,
    },
}

/// Client for the speech-synthesis service.
pub struct SpeechClient {
    http: Client,
    config: SpeechConfig,
}

impl SpeechClient {
    /// Construct a client from a shared HTTP client and resolved settings.
    pub fn new(http: Client, config: SpeechConfig) -> Self {
        Self { http, config }
    }

    /// Synthesize `text` into mp3 bytes.
    pub async fn synthesize(
        &self,
        text: &str,
        lang: &str,
        voice: &str,
    ) -> Result<Vec<u8>, SpeechError> {
        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.config.region
        );
        let response = self
            .http
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "billscan-tts")
            .body(ssml(text, lang, voice))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Speech synthesis rejected");
            return Err(SpeechError::Upstream { status, detail });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Build the SSML document for one synthesis call.
///
/// An empty `voice` falls back to a language-appropriate default, and the
/// `xml:lang` tag follows the language prefix.
pub fn ssml(text: &str, lang: &str, voice: &str) -> String {
    let spanish = lang.to_lowercase().starts_with("es");
    let voice = if voice.is_empty() {
        if spanish {
            "es-MX-DaliaNeural"
        } else {
            "en-US-JennyNeural"
        }
    } else {
        voice
    };
    let lang_tag = if spanish { "es-MX" } else { "en-US" };
    format!(
        "<speak version='1.0' xml:lang='{lang_tag}'>\n  <voice name='{voice}'>{text}</voice>\n</speak>"
    )
}
