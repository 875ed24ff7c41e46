//! HTTP surface for billscan.
//!
//! A compact Axum router with three endpoints:
//!
//! - `POST /parse` – Resolve an uploaded document (raw bytes, multipart, or
//!   JSON+base64), submit it to the document-analysis service, poll the
//!   operation to completion, and return the extracted text plus the
//!   structured-field placeholders.
//! - `POST /speak` – Synthesize speech for a piece of text, returning mp3
//!   bytes.
//! - `GET /healthz` – Liveness probe.
//!
//! `OPTIONS` on the POST routes answers CORS preflights with `204`. Every
//! response carries CORS headers: the origin is echoed only when it is on the
//! configured allow-list.
//!
//! Status-code policy: `400` for malformed client input (empty body, no file
//! part), `200` with `ok:false` for server misconfiguration and every
//! upstream analysis failure (so a browser `fetch` does not mistake them for
//! transport errors), `500` only for unexpected internal faults.

use crate::analysis::{AnalysisClient, AnalysisOutcome, extract};
use crate::config::Config;
use crate::downstream::speech::SpeechClient;
use crate::downstream::summarize::{DocumentFields, SummaryOutcome, Summarizer, get_summarizer};
use crate::trace::{DebugReport, DebugTrace};
use crate::upload::{self, UploadError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Shared per-process state: configuration, the HTTP client, and the
/// summarization collaborator.
pub struct AppState {
    /// Process configuration, read-only after startup.
    pub config: Config,
    /// Shared outbound HTTP client.
    pub http: reqwest::Client,
    /// Summarization collaborator invoked with extracted text.
    pub summarizer: Box<dyn Summarizer>,
}

impl AppState {
    /// Build the state from a loaded configuration.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent("billscan/0.2")
            .build()?;
        Ok(Self {
            config,
            http,
            summarizer: get_summarizer(),
        })
    }
}

/// Build the HTTP router exposing the parse and speak endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/parse", post(parse_document).options(preflight))
        .route("/speak", post(speak).options(preflight))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Wire shape shared by success and failure replies of `POST /parse`.
#[derive(Serialize)]
struct ParseResponse {
    ok: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ocr_text_snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ocr_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary_translated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<DocumentFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<DebugReport>,
}

impl ParseResponse {
    fn success(text: String, summary: SummaryOutcome, debug: Option<DebugReport>) -> Self {
        Self {
            ok: true,
            message: "analysis complete".into(),
            ocr_text_snippet: Some(extract::snippet(&text)),
            ocr_text: Some(text),
            summary_en: Some(summary.summary_en),
            summary_translated: Some(summary.summary_translated),
            fields: Some(summary.fields),
            debug,
        }
    }

    fn failure(message: impl Into<String>, debug: Option<DebugReport>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            ocr_text_snippet: None,
            ocr_text: None,
            summary_en: None,
            summary_translated: None,
            fields: None,
            debug,
        }
    }
}

/// Handle `POST /parse`: the full upload → submit → poll → extract pipeline.
async fn parse_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cors = cors_headers(header_str(&headers, &header::ORIGIN), &state.config);
    let (status, payload) = match run_parse(&state, &headers, &body).await {
        Ok(reply) => reply,
        Err(err) => {
            // Unexpected internal fault: log the detail, sanitize the client
            // message.
            tracing::error!(error = %err, "Unhandled failure in parse pipeline");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ParseResponse::failure("internal server error", None),
            )
        }
    };
    with_cors((status, Json(payload)).into_response(), cors)
}

/// Pipeline body; expected failures come back as structured replies, and
/// only genuinely unexpected faults surface as `Err`.
async fn run_parse(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> anyhow::Result<(StatusCode, ParseResponse)> {
    let mut trace = DebugTrace::new();
    let declared = header_str(headers, &header::CONTENT_TYPE);

    let payload = match upload::resolve(declared, body, &mut trace) {
        Ok(payload) => payload,
        Err(err @ (UploadError::EmptyBody | UploadError::NoFileFound)) => {
            tracing::info!(error = %err, "Rejected upload");
            return Ok((
                StatusCode::BAD_REQUEST,
                ParseResponse::failure(err.to_string(), debug_report(trace, &state.config)),
            ));
        }
    };

    let analysis_config = match state.config.analysis() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Analysis service misconfigured");
            trace.push("analysis service not configured");
            return Ok((
                StatusCode::OK,
                ParseResponse::failure(err.to_string(), debug_report(trace, &state.config)),
            ));
        }
    };

    let client = AnalysisClient::new(state.http.clone(), analysis_config);
    let outcome = match client
        .analyze(&payload.bytes, &payload.content_type, &mut trace)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            return Ok((
                StatusCode::OK,
                ParseResponse::failure(err.to_string(), debug_report(trace, &state.config)),
            ));
        }
    };

    match outcome {
        AnalysisOutcome::Succeeded(terminal) => {
            let text = extract::extract_text(&terminal);
            trace.push(format!("extracted {} characters", text.chars().count()));
            let summary = match state.summarizer.summarize(&text, "es").await {
                Ok(summary) => summary,
                Err(err) => {
                    // Summaries are best-effort; the extracted text still
                    // goes out.
                    tracing::warn!(error = %err, "Summarization failed");
                    SummaryOutcome::default()
                }
            };
            tracing::info!(
                chars = text.chars().count(),
                filename = payload.filename.as_deref().unwrap_or(""),
                "Parse request completed"
            );
            Ok((
                StatusCode::OK,
                ParseResponse::success(text, summary, debug_report(trace, &state.config)),
            ))
        }
        AnalysisOutcome::Failed(terminal) => {
            let code = terminal
                .pointer("/error/code")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            trace.push(format!("analysis reported failure ({code})"));
            Ok((
                StatusCode::OK,
                ParseResponse::failure(
                    format!("analysis failed ({code})"),
                    debug_report(trace, &state.config),
                ),
            ))
        }
        AnalysisOutcome::TimedOut => Ok((
            StatusCode::OK,
            ParseResponse::failure(
                "analysis timed out before completing",
                debug_report(trace, &state.config),
            ),
        )),
    }
}

/// Handle `POST /speak`: synthesize mp3 audio for a piece of text.
///
/// A body that is not valid JSON is treated as empty, which surfaces as the
/// missing-text rejection.
async fn speak(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let cors = cors_headers(header_str(&headers, &header::ORIGIN), &state.config);
    let request: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    let text = request
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    let lang = request
        .get("lang")
        .and_then(Value::as_str)
        .unwrap_or("en-US");
    let voice = request.get("voice").and_then(Value::as_str).unwrap_or("");

    if text.is_empty() {
        let reply = (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No text provided." })),
        );
        return with_cors(reply.into_response(), cors);
    }

    let speech_config = match state.config.speech() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Speech service misconfigured");
            let reply = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            );
            return with_cors(reply.into_response(), cors);
        }
    };

    let client = SpeechClient::new(state.http.clone(), speech_config);
    match client.synthesize(&text, lang, voice).await {
        Ok(audio) => {
            let reply = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "audio/mpeg")],
                audio,
            );
            with_cors(reply.into_response(), cors)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Speech synthesis failed");
            let reply = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "speech synthesis failed", "detail": err.to_string() })),
            );
            with_cors(reply.into_response(), cors)
        }
    }
}

/// Answer CORS preflights with `204 No Content` and the CORS header set.
async fn preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let cors = cors_headers(header_str(&headers, &header::ORIGIN), &state.config);
    with_cors(StatusCode::NO_CONTENT.into_response(), cors)
}

/// Liveness probe.
async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "message": "billscan alive" }))
}

/// Serialize the trace only when the deployment opted into verbose debug;
/// the trace leaks operation URLs and upstream body previews otherwise.
fn debug_report(trace: DebugTrace, config: &Config) -> Option<DebugReport> {
    config.verbose_debug.then(|| trace.into_report())
}

/// Build the CORS header set, echoing the origin only when allow-listed.
fn cors_headers(origin: Option<&str>, config: &Config) -> HeaderMap {
    let allowed = origin
        .filter(|origin| config.allowed_origins.iter().any(|entry| entry == origin))
        .unwrap_or("");

    let mut headers = HeaderMap::new();
    let entries: [(HeaderName, &str); 4] = [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed),
        (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ];
    for (name, value) in entries {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
    headers
}

fn with_cors(mut response: Response, cors: HeaderMap) -> Response {
    response.headers_mut().extend(cors);
    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
