//! Router-level end-to-end tests with the analysis service mocked.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use billscan::api::{AppState, create_router};
use billscan::config::Config;
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

const SUBMIT_PATH: &str = "/documentintelligence/documentModels/prebuilt-read:analyze";

fn test_config(endpoint: &str, verbose_debug: bool) -> Config {
    Config {
        analysis_endpoint: Some(endpoint.trim_end_matches('/').to_string()),
        analysis_key: Some("integration-key".into()),
        poll_attempts: 5,
        poll_interval: Duration::from_millis(5),
        verbose_debug,
        ..Config::default()
    }
}

fn app(config: Config) -> axum::Router {
    create_router(Arc::new(AppState::new(config).expect("state")))
}

fn multipart_pdf_body(boundary: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"bill.pdf\"\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn multipart_upload_round_trips_to_extracted_text() {
    let server = MockServer::start_async().await;
    let operation_url = format!("{}/operations/op-e2e", server.base_url());
    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUBMIT_PATH)
                .header("Ocp-Apim-Subscription-Key", "integration-key")
                // No part-level type in the body below, so the sniffer
                // decides from the %PDF signature.
                .header("content-type", "application/pdf");
            then.status(202).header("Operation-Location", &operation_url);
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/operations/op-e2e");
            then.status(200).json_body(json!({
                "status": "succeeded",
                "analyzeResult": { "content": "Hello" }
            }));
        })
        .await;

    // Exactly ten bytes carrying the PDF signature.
    let payload = b"%PDF-1.4 x";
    assert_eq!(payload.len(), 10);
    let body = multipart_pdf_body("e2eBoundary", payload);

    let response = app(test_config(&server.base_url(), true))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/parse")
                .header(
                    "content-type",
                    "multipart/form-data; boundary=e2eBoundary",
                )
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    submit.assert_async().await;
    poll.assert_async().await;

    assert_eq!(json["ok"], true);
    assert_eq!(json["ocr_text"], "Hello");
    assert_eq!(json["ocr_text_snippet"], "Hello");
    // Placeholder summaries and fields until a collaborator is plugged in.
    assert_eq!(json["summary_en"], "");
    assert_eq!(json["summary_translated"], "");
    assert_eq!(json["fields"]["amount_due"]["value"], "");
    assert_eq!(json["fields"]["amount_due"]["confidence"], 0.0);
    assert_eq!(json["fields"]["service_address"]["confidence"], 0.0);

    // verbose_debug was on, so the trace is present and carries the
    // operation URL.
    assert_eq!(json["debug"]["operation_url"], operation_url);
    assert!(
        json["debug"]["steps"]
            .as_array()
            .is_some_and(|steps| !steps.is_empty())
    );
}

#[tokio::test]
async fn empty_body_never_reaches_the_analysis_service() {
    let server = MockServer::start_async().await;
    let submit = server
        .mock_async(|when, then| {
            when.method(POST).path(SUBMIT_PATH);
            then.status(202);
        })
        .await;

    let response = app(test_config(&server.base_url(), false))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/parse")
                .header("content-type", "application/pdf")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    submit.assert_hits_async(0).await;
}

#[tokio::test]
async fn json_base64_upload_is_preferred_over_declared_type() {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    let server = MockServer::start_async().await;
    let operation_url = format!("{}/operations/op-json", server.base_url());
    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUBMIT_PATH)
                .header("content-type", "application/pdf");
            then.status(202).header("operation-location", &operation_url);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/operations/op-json");
            then.status(200)
                .json_body(json!({ "status": "succeeded", "content": "From JSON" }));
        })
        .await;

    let body = json!({ "bytes_b64": STANDARD.encode(b"%PDF-1.7 json leg") }).to_string();

    // The declared type lies about being multipart; the JSON leg wins.
    let response = app(test_config(&server.base_url(), false))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/parse")
                .header("content-type", "multipart/form-data; boundary=nope")
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["ocr_text"], "From JSON");
    // Debug trace is suppressed in the default (non-verbose) posture.
    assert!(json.get("debug").is_none());
    submit.assert_async().await;
}

#[tokio::test]
async fn upstream_failure_is_ok_false_with_200() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(SUBMIT_PATH);
            then.status(503).body("service unavailable");
        })
        .await;

    let response = app(test_config(&server.base_url(), false))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/parse")
                .header("content-type", "image/png")
                .body(Body::from(b"\x89PNG\r\n\x1a\nimage-data".to_vec()))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
}
