//! Purpose-built `multipart/form-data` parser.
//!
//! This is deliberately not a general MIME reader: the inbound contract is
//! one document per request, so only the first file-bearing part matters and
//! multiple file fields are not distinguished. The parser works on raw bytes
//! because document payloads are not UTF-8; only part headers are decoded as
//! text. It sits behind a single function so a streaming multipart reader
//! could replace it without touching callers.

/// First file-bearing part extracted from a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Raw bytes of the part body, trailing CRLF trimmed.
    pub bytes: Vec<u8>,
    /// Part-level `Content-Type` header, when one was declared.
    pub content_type: Option<String>,
    /// Filename from the `Content-Disposition` header.
    pub filename: String,
}

/// Extract the first file-bearing part from a multipart body.
///
/// `content_type_header` is the request's full `Content-Type` value; the
/// boundary token is read from it (surrounding quotes stripped). Returns
/// `None` when the boundary is absent or no part carries a
/// `Content-Disposition` header with a `filename=` attribute — plain form
/// fields never qualify.
pub fn extract(body: &[u8], content_type_header: &str) -> Option<FilePart> {
    let boundary = boundary_token(content_type_header)?;
    let delimiter = format!("--{boundary}");

    for segment in split_on(body, delimiter.as_bytes()) {
        let segment = trim_segment(segment);
        if segment.is_empty() {
            continue;
        }
        // Segments without a header/body separator (the preamble, the
        // epilogue) are skipped, not fatal.
        let Some((headers, part_body)) = split_headers(segment) else {
            continue;
        };
        let headers = String::from_utf8_lossy(headers);

        let Some(disposition) = header_value(&headers, "content-disposition") else {
            continue;
        };
        let Some(filename) = attribute_value(disposition, "filename") else {
            continue;
        };

        return Some(FilePart {
            // Only the trailing CRLF belongs to the framing; leading CR/LF
            // bytes are payload.
            bytes: trim_crlf_end(part_body).to_vec(),
            content_type: header_value(&headers, "content-type").map(|v| v.trim().to_string()),
            filename,
        });
    }

    None
}

/// Read the boundary token from a `Content-Type` header value.
///
/// MIME parameter names are case-insensitive, so `Boundary=` counts too.
fn boundary_token(header: &str) -> Option<String> {
    let marker = "boundary=";
    let pos = header.to_ascii_lowercase().find(marker)?;
    let rest = &header[pos + marker.len()..];
    let token = rest.split(';').next().unwrap_or(rest).trim();
    let token = token.trim_matches('"');
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Split a byte slice on every occurrence of `needle`.
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut start = 0;
    while let Some(pos) = find(&haystack[start..], needle) {
        segments.push(&haystack[start..start + pos]);
        start += pos + needle.len();
    }
    segments.push(&haystack[start..]);
    segments
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Trim leading/trailing CRLF and the terminal `--` marker from a segment.
fn trim_segment(segment: &[u8]) -> &[u8] {
    let segment = trim_crlf(segment);
    segment.strip_suffix(b"--").map_or(segment, trim_crlf)
}

fn trim_crlf(mut bytes: &[u8]) -> &[u8] {
    while bytes.first().is_some_and(|b| *b == b'\r' || *b == b'\n') {
        bytes = &bytes[1..];
    }
    trim_crlf_end(bytes)
}

fn trim_crlf_end(mut bytes: &[u8]) -> &[u8] {
    while bytes.last().is_some_and(|b| *b == b'\r' || *b == b'\n') {
        bytes = &bytes[..bytes.len() - 1];
    }
    bytes
}

/// Split a segment into its header block and body at the blank-line marker.
fn split_headers(segment: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = find(segment, b"\r\n\r\n")?;
    Some((&segment[..pos], &segment[pos + 4..]))
}

/// Look up a part header value by case-insensitive name.
fn header_value<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Read a `name=value` attribute from a header value, quoted or bare.
fn attribute_value(header: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=");
    let (_, rest) = header.split_once(&marker)?;
    let value = if let Some(stripped) = rest.strip_prefix('"') {
        stripped.split('"').next().unwrap_or("")
    } else {
        rest.split(';').next().unwrap_or(rest).trim()
    };
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart_body(boundary: &str, parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (headers, payload) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n{headers}\r\n\r\n").as_bytes());
            body.extend_from_slice(payload);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    #[test]
    fn extracts_first_file_part() {
        let payload = b"%PDF-1.4 fake bill";
        let body = multipart_body(
            "xyzBoundary",
            &[(
                "Content-Disposition: form-data; name=\"file\"; filename=\"bill.pdf\"\r\nContent-Type: application/pdf",
                payload,
            )],
        );

        let part = extract(&body, "multipart/form-data; boundary=xyzBoundary")
            .expect("file part present");
        assert_eq!(part.bytes, payload);
        assert_eq!(part.filename, "bill.pdf");
        assert_eq!(part.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn skips_plain_form_fields() {
        let body = multipart_body(
            "b1",
            &[
                ("Content-Disposition: form-data; name=\"lang\"", b"es"),
                (
                    "Content-Disposition: form-data; name=\"doc\"; filename=\"scan.png\"",
                    b"\x89PNGdata",
                ),
            ],
        );

        let part = extract(&body, "multipart/form-data; boundary=b1").expect("file part present");
        assert_eq!(part.filename, "scan.png");
        assert_eq!(part.bytes, b"\x89PNGdata");
        assert!(part.content_type.is_none());
    }

    #[test]
    fn no_filename_means_not_found() {
        let body = multipart_body(
            "b2",
            &[("Content-Disposition: form-data; name=\"comment\"", b"hello")],
        );
        assert!(extract(&body, "multipart/form-data; boundary=b2").is_none());
    }

    #[test]
    fn missing_boundary_means_not_found() {
        assert!(extract(b"anything", "multipart/form-data").is_none());
        assert!(extract(b"anything", "multipart/form-data; boundary=").is_none());
    }

    #[test]
    fn quoted_boundary_and_bare_filename_are_accepted() {
        let body = multipart_body(
            "quoted",
            &[(
                "Content-Disposition: form-data; name=\"f\"; filename=photo.jpg",
                b"\xFF\xD8\xFFjpeg",
            )],
        );

        let part = extract(&body, "multipart/form-data; boundary=\"quoted\"")
            .expect("file part present");
        assert_eq!(part.filename, "photo.jpg");
        assert_eq!(part.bytes, b"\xFF\xD8\xFFjpeg");
    }

    #[test]
    fn binary_payload_with_crlf_bytes_survives() {
        let payload = b"line1\r\nline2\x00\x01\x02";
        let body = multipart_body(
            "bin",
            &[(
                "Content-Disposition: form-data; name=\"f\"; filename=\"raw.bin\"",
                payload,
            )],
        );
        let part = extract(&body, "multipart/form-data; boundary=bin").expect("file part present");
        assert_eq!(part.bytes, payload);

        // Leading CR/LF bytes belong to the payload, not the framing.
        let payload = b"\r\npayload-starting-with-crlf";
        let body = multipart_body(
            "bin",
            &[(
                "Content-Disposition: form-data; name=\"f\"; filename=\"raw.bin\"",
                payload,
            )],
        );
        let part = extract(&body, "multipart/form-data; boundary=bin").expect("file part present");
        assert_eq!(part.bytes, payload);
    }

    #[test]
    fn preamble_before_first_boundary_is_ignored() {
        let mut body = b"This preamble has no header separator and must be skipped".to_vec();
        body.extend_from_slice(&multipart_body(
            "pre",
            &[(
                "Content-Disposition: form-data; name=\"f\"; filename=\"a.pdf\"",
                b"%PDF-1.4 data",
            )],
        ));

        let part = extract(&body, "multipart/form-data; boundary=pre").expect("file part present");
        assert_eq!(part.filename, "a.pdf");
        assert_eq!(part.bytes, b"%PDF-1.4 data");
    }

    #[test]
    fn boundary_parameter_is_case_insensitive() {
        let body = multipart_body(
            "caps",
            &[(
                "Content-Disposition: form-data; name=\"f\"; filename=\"a.pdf\"",
                b"%PDF-1.4 data",
            )],
        );

        let part = extract(&body, "multipart/form-data; Boundary=caps").expect("file part present");
        assert_eq!(part.filename, "a.pdf");
    }
}
