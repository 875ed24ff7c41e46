//! Upload resolution: turning heterogeneous request encodings into one
//! `(bytes, content type, filename)` payload.
//!
//! Front-ends have shipped three encodings over time: raw document bytes,
//! `multipart/form-data` with a single file part, and JSON carrying the
//! document as base64. [`resolve`] tries them in a fixed priority order and
//! produces a single [`UploadPayload`] or a structured error.

pub mod multipart;
pub mod sniff;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use thiserror::Error;

use crate::trace::DebugTrace;

/// Errors terminal to upload resolution. Both are client-input faults.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The request body was empty.
    #[error("Request body is empty")]
    EmptyBody,
    /// A multipart body contained no file-bearing part.
    #[error("No file found in multipart body")]
    NoFileFound,
}

/// Resolved document payload, ready for submission to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// Raw document bytes; non-empty by construction.
    pub bytes: Vec<u8>,
    /// Content type forwarded to the analysis service.
    pub content_type: String,
    /// Filename, when the encoding carried one.
    pub filename: Option<String>,
}

/// Resolve an inbound request body into an [`UploadPayload`].
///
/// Priority order:
/// 1. JSON carrying a `bytes_b64`/`data_b64` field (with an optional
///    `content_type` companion). Malformed JSON, a missing field, or invalid
///    base64 silently fall through — they are not errors.
/// 2. Multipart, when the declared content type says so. A multipart body
///    without a file part is a terminal [`UploadError::NoFileFound`].
/// 3. The raw body as the document, typed by the declared header when it is
///    forwardable, else by signature sniffing.
///
/// An empty body is a terminal [`UploadError::EmptyBody`] before anything
/// else is attempted.
pub fn resolve(
    declared_content_type: Option<&str>,
    body: &[u8],
    trace: &mut DebugTrace,
) -> Result<UploadPayload, UploadError> {
    if body.is_empty() {
        return Err(UploadError::EmptyBody);
    }

    if let Some(payload) = try_json_base64(body, trace)? {
        return Ok(payload);
    }

    let declared = declared_content_type.unwrap_or("");
    if declared
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        let Some(part) = multipart::extract(body, declared) else {
            trace.push("multipart body contained no file part");
            return Err(UploadError::NoFileFound);
        };
        if part.bytes.is_empty() {
            return Err(UploadError::EmptyBody);
        }
        let content_type = part
            .content_type
            .clone()
            .filter(|declared| sniff::is_forwardable(declared))
            .unwrap_or_else(|| sniff::sniff(&part.bytes).to_string());
        trace.push(format!(
            "multipart part '{}' resolved as {} ({} bytes)",
            part.filename,
            content_type,
            part.bytes.len()
        ));
        return Ok(UploadPayload {
            bytes: part.bytes,
            content_type,
            filename: Some(part.filename),
        });
    }

    let content_type = if sniff::is_forwardable(declared) {
        declared.to_string()
    } else {
        sniff::sniff(body).to_string()
    };
    trace.push(format!(
        "raw body resolved as {content_type} ({} bytes)",
        body.len()
    ));
    Ok(UploadPayload {
        bytes: body.to_vec(),
        content_type,
        filename: None,
    })
}

/// Attempt the JSON+base64 leg; `Ok(None)` means fall through.
fn try_json_base64(
    body: &[u8],
    trace: &mut DebugTrace,
) -> Result<Option<UploadPayload>, UploadError> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Ok(None);
    };
    let Some(encoded) = ["bytes_b64", "data_b64"]
        .iter()
        .find_map(|field| value.get(field).and_then(Value::as_str))
    else {
        return Ok(None);
    };
    let Ok(bytes) = BASE64.decode(encoded.trim()) else {
        return Ok(None);
    };
    if bytes.is_empty() {
        return Err(UploadError::EmptyBody);
    }

    let content_type = value
        .get("content_type")
        .and_then(Value::as_str)
        .filter(|declared| sniff::is_forwardable(declared))
        .map(str::to_string)
        .unwrap_or_else(|| sniff::sniff(&bytes).to_string());
    let filename = value
        .get("filename")
        .and_then(Value::as_str)
        .map(str::to_string);
    trace.push(format!(
        "json base64 payload resolved as {content_type} ({} bytes)",
        bytes.len()
    ));
    Ok(Some(UploadPayload {
        bytes,
        content_type,
        filename,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trace() -> DebugTrace {
        DebugTrace::new()
    }

    #[test]
    fn empty_body_is_terminal() {
        assert_eq!(
            resolve(Some("application/pdf"), b"", &mut trace()),
            Err(UploadError::EmptyBody)
        );
    }

    #[test]
    fn json_base64_wins_over_declared_multipart() {
        let body = json!({
            "bytes_b64": BASE64.encode(b"%PDF-1.4 doc"),
            "filename": "bill.pdf"
        })
        .to_string();

        // Declared type lies; the parseable JSON body takes priority.
        let payload = resolve(
            Some("multipart/form-data; boundary=whatever"),
            body.as_bytes(),
            &mut trace(),
        )
        .expect("json leg wins");
        assert_eq!(payload.bytes, b"%PDF-1.4 doc");
        assert_eq!(payload.content_type, "application/pdf");
        assert_eq!(payload.filename.as_deref(), Some("bill.pdf"));
    }

    #[test]
    fn json_companion_content_type_is_honored() {
        let body = json!({
            "data_b64": BASE64.encode(b"not-really-an-image"),
            "content_type": "image/jpeg"
        })
        .to_string();

        let payload = resolve(None, body.as_bytes(), &mut trace()).expect("json leg");
        assert_eq!(payload.content_type, "image/jpeg");
    }

    #[test]
    fn malformed_json_falls_through_to_raw() {
        let payload = resolve(Some("application/json"), b"{not json", &mut trace())
            .expect("raw fallthrough");
        assert_eq!(payload.bytes, b"{not json");
        // application/json is not forwardable, so the body gets sniffed.
        assert_eq!(payload.content_type, sniff::OCTET_STREAM);
    }

    #[test]
    fn json_without_base64_field_falls_through() {
        let body = json!({"text": "hello"}).to_string();
        let payload = resolve(None, body.as_bytes(), &mut trace()).expect("raw fallthrough");
        assert_eq!(payload.bytes, body.as_bytes());
    }

    #[test]
    fn multipart_without_file_part_is_no_file_found() {
        let body = b"--b\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nvalue\r\n--b--\r\n";
        assert_eq!(
            resolve(
                Some("multipart/form-data; boundary=b"),
                body,
                &mut trace()
            ),
            Err(UploadError::NoFileFound)
        );
    }

    #[test]
    fn multipart_part_type_wins_else_sniffed() {
        let body = b"--b\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.gif\"\r\n\r\nGIF89a123\r\n--b--\r\n";
        let payload = resolve(
            Some("multipart/form-data; boundary=b"),
            body,
            &mut trace(),
        )
        .expect("file part");
        // No part-level Content-Type, so the PNG/GIF sniffer decides.
        assert_eq!(payload.content_type, "image/gif");
        assert_eq!(payload.filename.as_deref(), Some("a.gif"));
    }

    #[test]
    fn raw_body_keeps_forwardable_declared_type() {
        let payload =
            resolve(Some("image/png"), b"anything", &mut trace()).expect("raw body accepted");
        assert_eq!(payload.content_type, "image/png");
        assert!(payload.filename.is_none());
    }

    #[test]
    fn raw_body_with_generic_type_is_sniffed() {
        let payload = resolve(
            Some("application/octet-stream"),
            b"%PDF-1.7 content",
            &mut trace(),
        )
        .expect("raw body accepted");
        assert_eq!(payload.content_type, "application/pdf");
    }
}
