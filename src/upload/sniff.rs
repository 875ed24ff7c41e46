//! Magic-number content sniffing.
//!
//! The analysis service needs a concrete document content type; browsers and
//! intermediate proxies often declare a generic or non-forwardable one. This
//! sniffer classifies a byte buffer by signature prefix and never fails.

/// Fallback returned when no signature matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Signatures checked in order against the buffer prefix.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF", "application/pdf"),
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], "image/png"),
    (b"II*\0", "image/tiff"),
    (b"MM\0*", "image/tiff"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
];

/// Classify a byte buffer by magic-number signature.
///
/// Returns [`OCTET_STREAM`] when no known signature matches.
pub fn sniff(bytes: &[u8]) -> &'static str {
    SIGNATURES
        .iter()
        .find(|(prefix, _)| bytes.starts_with(prefix))
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Whether a declared content type is trustworthy enough to forward verbatim.
///
/// Generic (`application/octet-stream`) and envelope types such as
/// `multipart/form-data` describe the transport, not the document, and must
/// be replaced by a sniffed type.
pub fn is_forwardable(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    !lowered.is_empty()
        && lowered != OCTET_STREAM
        && !lowered.starts_with("multipart/")
        && !lowered.starts_with("application/json")
}
