//! Text extraction from terminal analysis payloads.
//!
//! The service has shipped two response shapes: a flattened `content` string
//! (top level or under `analyzeResult`) and an older page/line structure
//! without one. Extraction prefers the flattened form and falls back to
//! walking pages and lines in order.

use serde_json::Value;

/// Number of characters kept in the preview snippet.
pub const SNIPPET_CHARS: usize = 500;

/// Extract the full document text from a terminal payload.
///
/// Resolution order: top-level `content`, then `analyzeResult.content`, then
/// the concatenation of every `pages[].lines[].content` in page and line
/// order, newline-separated. Returns an empty string when none of the shapes
/// are present.
pub fn extract_text(payload: &Value) -> String {
    if let Some(content) = payload.get("content").and_then(Value::as_str) {
        return content.to_string();
    }

    let analyze_result = payload.get("analyzeResult");
    if let Some(content) = analyze_result
        .and_then(|result| result.get("content"))
        .and_then(Value::as_str)
    {
        return content.to_string();
    }

    let pages = payload
        .get("pages")
        .or_else(|| analyze_result.and_then(|result| result.get("pages")))
        .and_then(Value::as_array);

    let Some(pages) = pages else {
        return String::new();
    };

    let mut lines = Vec::new();
    for page in pages {
        let Some(page_lines) = page.get("lines").and_then(Value::as_array) else {
            continue;
        };
        for line in page_lines {
            if let Some(content) = line.get("content").and_then(Value::as_str) {
                lines.push(content);
            }
        }
    }
    lines.join("\n")
}

/// Bounded preview of the full text, safe on character boundaries.
pub fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}
