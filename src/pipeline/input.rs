//! Input resolution: turn a [`DocumentRef`] into an in-memory byte buffer.
//!
//! Three reference forms are accepted:
//!
//! * `Url`: a single GET through the injected [`ByteStore`]. No retry here:
//!   a non-2xx status, a transport error or the configured timeout ends the
//!   run with a `download` failure.
//! * `DataUri`: `data:<mime>;base64,<payload>`, decoded locally.
//! * `Bytes`: already in memory, passed through unchanged.
//!
//! Nothing is written to disk.

use crate::capability::{with_timeout, ByteStore};
use crate::error::{CapabilityError, PipelineError};
use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
    Engine as _,
};
use tracing::{debug, info};

/// A reference to the document a run should process. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    /// Remote HTTP(S) URL.
    Url(String),
    /// Inline `data:` URI with a base64 payload.
    DataUri(String),
    /// Bytes the caller already holds.
    Bytes {
        bytes: Vec<u8>,
        declared_mime: Option<String>,
        file_name: Option<String>,
    },
}

impl DocumentRef {
    pub fn url(url: impl Into<String>) -> Self {
        DocumentRef::Url(url.into())
    }

    pub fn data_uri(uri: impl Into<String>) -> Self {
        DocumentRef::DataUri(uri.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        DocumentRef::Bytes {
            bytes: bytes.into(),
            declared_mime: None,
            file_name: None,
        }
    }

    /// Attach a declared MIME type to a `Bytes` reference; no-op otherwise.
    pub fn with_declared_mime(mut self, mime: impl Into<String>) -> Self {
        if let DocumentRef::Bytes { declared_mime, .. } = &mut self {
            *declared_mime = Some(mime.into());
        }
        self
    }

    /// Attach a file name to a `Bytes` reference; no-op otherwise.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        if let DocumentRef::Bytes { file_name, .. } = &mut self {
            *file_name = Some(name.into());
        }
        self
    }

    /// Short description for logs. Never includes payload bytes.
    pub fn describe(&self) -> String {
        match self {
            DocumentRef::Url(url) => url.clone(),
            DocumentRef::DataUri(uri) => format!("data URI ({} chars)", uri.len()),
            DocumentRef::Bytes {
                bytes, file_name, ..
            } => format!(
                "{} ({} bytes)",
                file_name.as_deref().unwrap_or("<buffer>"),
                bytes.len()
            ),
        }
    }
}

/// Bytes plus what the source said about them.
#[derive(Debug, Clone)]
pub struct ResolvedBytes {
    pub bytes: Vec<u8>,
    pub content_length: usize,
    pub declared_mime: Option<String>,
    pub file_name: Option<String>,
}

impl ResolvedBytes {
    fn new(bytes: Vec<u8>, declared_mime: Option<String>, file_name: Option<String>) -> Self {
        Self {
            content_length: bytes.len(),
            bytes,
            declared_mime,
            file_name,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the input string looks like a data URI.
pub fn is_data_uri(input: &str) -> bool {
    input
        .get(..5)
        .map(|p| p.eq_ignore_ascii_case("data:"))
        .unwrap_or(false)
}

/// Resolve a document reference to bytes.
pub async fn resolve(
    doc: DocumentRef,
    store: &dyn ByteStore,
    timeout_secs: u64,
) -> Result<ResolvedBytes, PipelineError> {
    match doc {
        DocumentRef::Url(url) => download(&url, store, timeout_secs).await,
        DocumentRef::DataUri(uri) => {
            let (bytes, mime) = decode_data_uri(&uri)?;
            debug!("Decoded data URI: {} bytes, mime {:?}", bytes.len(), mime);
            Ok(ResolvedBytes::new(bytes, mime, None))
        }
        DocumentRef::Bytes {
            bytes,
            declared_mime,
            file_name,
        } => Ok(ResolvedBytes::new(bytes, declared_mime, file_name)),
    }
}

/// Decode `data:<mime>[;params];base64,<payload>`.
///
/// Returns the payload bytes and the MIME type (without parameters) if one
/// was given. ASCII whitespace inside the payload is ignored; missing `=`
/// padding is tolerated.
pub fn decode_data_uri(uri: &str) -> Result<(Vec<u8>, Option<String>), PipelineError> {
    if !is_data_uri(uri) {
        return Err(PipelineError::MalformedDataUri {
            reason: "missing 'data:' scheme".into(),
        });
    }
    let rest = &uri[5..];
    // Scheme and encoding token are both case-insensitive.
    let Some(marker) = rest.to_ascii_lowercase().find(";base64,") else {
        return Err(PipelineError::MalformedDataUri {
            reason: "missing ';base64,' marker".into(),
        });
    };

    let header = &rest[..marker];
    let mime = header
        .split(';')
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let payload: String = rest[marker + ";base64,".len()..]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(&payload)
        .or_else(|_| STANDARD_NO_PAD.decode(&payload))
        .map_err(|e| PipelineError::InvalidBase64 {
            detail: e.to_string(),
        })?;

    Ok((bytes, mime))
}

/// One GET through the byte store, bounded by `timeout_secs`.
async fn download(
    url: &str,
    store: &dyn ByteStore,
    timeout_secs: u64,
) -> Result<ResolvedBytes, PipelineError> {
    if !is_url(url) {
        return Err(PipelineError::InvalidInput {
            input: url.to_string(),
        });
    }

    info!("Downloading document from: {}", url);

    let fetched = with_timeout(timeout_secs, store.fetch(url))
        .await
        .map_err(|e| match e {
            CapabilityError::Timeout { secs } => PipelineError::DownloadTimeout {
                url: url.to_string(),
                secs,
            },
            CapabilityError::Http { status } => PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
                status: Some(status),
            },
            other => PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: other.to_string(),
                status: None,
            },
        })?;

    info!("Downloaded {} bytes", fetched.bytes.len());

    Ok(ResolvedBytes::new(
        fetched.bytes,
        fetched.content_type,
        file_name_from_url(url),
    ))
}

/// Extract a file name from the last URL path segment, if it has an extension.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if !last.is_empty() && last.contains('.') {
        Some(last.to_string())
    } else {
        None
    }
}
