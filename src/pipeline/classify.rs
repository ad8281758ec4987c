//! Type classification: declared type, file extension, then magic bytes.
//!
//! Total over its inputs: anything unrecognised is [`DocumentKind::Unknown`],
//! never an error. Resolution order, first match wins:
//!
//! 1. the declared type string (MIME or bare extension), substring-matched
//! 2. the file-name extension, through the same table
//! 3. magic-byte sniffing of the buffer
//!
//! ZIP containers are classified as office documents. A plain `.zip` archive
//! collides with this rule; the office reader then fails and the run reports
//! the failure instead of guessing harder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical format family used to pick an extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    OfficeDocument,
    Image,
    Html,
    PlainText,
    Unknown,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::Pdf,
        DocumentKind::OfficeDocument,
        DocumentKind::Image,
        DocumentKind::Html,
        DocumentKind::PlainText,
        DocumentKind::Unknown,
    ];

    /// Lowercase label used in prose ("a pdf document").
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::OfficeDocument => "office",
            DocumentKind::Image => "image",
            DocumentKind::Html => "html",
            DocumentKind::PlainText => "text",
            DocumentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const ZIP_LOCAL_HEADER: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const HTML_SNIFF_WINDOW: usize = 100;

/// Classify a document.
///
/// `declared` may be a MIME type (`application/pdf`) or a bare extension
/// (`docx`). `sample` is the head of the byte buffer; passing the whole
/// buffer is fine.
pub fn classify(
    declared: Option<&str>,
    file_name: Option<&str>,
    sample: Option<&[u8]>,
) -> DocumentKind {
    declared
        .and_then(kind_from_type_string)
        .or_else(|| file_name.and_then(extension).and_then(kind_from_type_string))
        .or_else(|| sample.and_then(sniff))
        .unwrap_or(DocumentKind::Unknown)
}

/// Match a type string case-insensitively against the substring table.
pub fn kind_from_type_string(s: &str) -> Option<DocumentKind> {
    let s = s.trim().to_ascii_lowercase();
    if s.is_empty() {
        return None;
    }
    let has = |needles: &[&str]| needles.iter().any(|n| s.contains(n));

    if has(&["pdf"]) {
        Some(DocumentKind::Pdf)
    } else if has(&[
        "doc",
        "word",
        "officedocument",
        "opendocument",
        "vnd.ms-",
        "xls",
        "ppt",
    ]) {
        Some(DocumentKind::OfficeDocument)
    } else if has(&["jpg", "jpeg", "png", "tif", "image/"]) {
        Some(DocumentKind::Image)
    } else if has(&["htm"]) {
        Some(DocumentKind::Html)
    } else if has(&["txt", "text"]) {
        Some(DocumentKind::PlainText)
    } else {
        None
    }
}

/// Identify a buffer by its leading bytes.
pub fn sniff(bytes: &[u8]) -> Option<DocumentKind> {
    if bytes.starts_with(b"%PDF") {
        return Some(DocumentKind::Pdf);
    }
    if bytes.starts_with(&ZIP_LOCAL_HEADER) {
        return Some(DocumentKind::OfficeDocument);
    }
    if bytes.starts_with(&[0xFF, 0xD8]) || bytes.starts_with(&PNG_SIGNATURE) {
        return Some(DocumentKind::Image);
    }
    let head = &bytes[..bytes.len().min(HTML_SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    if head.contains("<!doctype html") || head.contains("<html") {
        return Some(DocumentKind::Html);
    }
    None
}

/// Extension of a file name, without the dot. `None` for dotless names.
fn extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_mime_types() {
        assert_eq!(classify(Some("application/pdf"), None, None), DocumentKind::Pdf);
        assert_eq!(
            classify(
                Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                None,
                None
            ),
            DocumentKind::OfficeDocument
        );
        assert_eq!(classify(Some("application/msword"), None, None), DocumentKind::OfficeDocument);
        assert_eq!(classify(Some("IMAGE/JPEG"), None, None), DocumentKind::Image);
        assert_eq!(classify(Some("text/html; charset=utf-8"), None, None), DocumentKind::Html);
        assert_eq!(classify(Some("text/plain"), None, None), DocumentKind::PlainText);
    }

    #[test]
    fn declared_bare_extensions() {
        assert_eq!(classify(Some("docx"), None, None), DocumentKind::OfficeDocument);
        assert_eq!(classify(Some("PNG"), None, None), DocumentKind::Image);
        assert_eq!(classify(Some("htm"), None, None), DocumentKind::Html);
        assert_eq!(classify(Some("txt"), None, None), DocumentKind::PlainText);
    }

    #[test]
    fn declared_type_beats_extension_and_bytes() {
        assert_eq!(
            classify(Some("text/plain"), Some("resume.pdf"), Some(b"%PDF-1.7")),
            DocumentKind::PlainText
        );
    }

    #[test]
    fn unmatched_declared_type_falls_through() {
        assert_eq!(
            classify(Some("application/octet-stream"), Some("letter.DOCX"), None),
            DocumentKind::OfficeDocument
        );
        assert_eq!(
            classify(Some("application/octet-stream"), None, Some(b"%PDF-1.4\n")),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn extension_from_paths() {
        assert_eq!(classify(None, Some("/tmp/scan.TIFF"), None), DocumentKind::Image);
        assert_eq!(classify(None, Some("C:\\docs\\page.html"), None), DocumentKind::Html);
        assert_eq!(classify(None, Some(".bashrc"), None), DocumentKind::Unknown);
        assert_eq!(classify(None, Some("README"), None), DocumentKind::Unknown);
    }

    #[test]
    fn magic_bytes() {
        assert_eq!(sniff(b"%PDF-1.7 ..."), Some(DocumentKind::Pdf));
        assert_eq!(sniff(&[b'P', b'K', 3, 4, 20, 0]), Some(DocumentKind::OfficeDocument));
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(DocumentKind::Image));
        assert_eq!(sniff(&PNG_SIGNATURE), Some(DocumentKind::Image));
        assert_eq!(sniff(b"  <!DOCTYPE HTML><html>"), Some(DocumentKind::Html));
        assert_eq!(sniff(b"<HTML lang=en>"), Some(DocumentKind::Html));
        assert_eq!(sniff(b"plain words"), None);
        assert_eq!(sniff(&[]), None);
    }

    #[test]
    fn html_marker_beyond_window_is_ignored() {
        let mut bytes = vec![b' '; 120];
        bytes.extend_from_slice(b"<html>");
        assert_eq!(sniff(&bytes), None);
    }

    #[test]
    fn nothing_known_is_unknown() {
        assert_eq!(classify(None, None, None), DocumentKind::Unknown);
        assert_eq!(classify(Some(""), Some(""), Some(&[0, 1, 2])), DocumentKind::Unknown);
    }
}
