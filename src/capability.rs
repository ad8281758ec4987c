//! External collaborators consumed by the pipeline.
//!
//! The pipeline never talks to a network or a model directly. It receives a
//! [`Capabilities`] bundle of trait objects at construction time, so a test
//! can hand it in-memory fakes and a server can hand it pooled clients. The
//! default adapters live in [`crate::backend`].
//!
//! None of these traits retry. A failed call is reported once and the
//! pipeline decides what happens next (fall through to the next extraction
//! strategy, or degrade the enrichment result). Retry-with-backoff, when
//! wanted, belongs inside an adapter.

use crate::error::CapabilityError;
use crate::pipeline::classify::DocumentKind;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Bytes returned by a [`ByteStore`], with the server's declared type if any.
#[derive(Debug, Clone, Default)]
pub struct FetchedBytes {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Arbitrary HTTP(S) GET.
#[async_trait]
pub trait ByteStore: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedBytes, CapabilityError>;
}

/// OCR / layout-aware text extraction for PDFs, images and unknown binaries.
#[async_trait]
pub trait DocumentUnderstanding: Send + Sync {
    async fn extract(&self, bytes: &[u8], kind_hint: DocumentKind)
        -> Result<String, CapabilityError>;
}

/// Office-document specific text extraction.
#[async_trait]
pub trait OfficeDocumentReader: Send + Sync {
    async fn extract_raw_text(&self, bytes: &[u8]) -> Result<String, CapabilityError>;
}

/// Single-turn text completion.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError>;
}

/// The four collaborator handles a [`crate::Pipeline`] runs against.
///
/// Cloning is cheap (four `Arc` bumps). The handles are shared read-only by
/// every concurrent run.
#[derive(Clone)]
pub struct Capabilities {
    pub byte_store: Arc<dyn ByteStore>,
    pub document_understanding: Arc<dyn DocumentUnderstanding>,
    pub office_reader: Arc<dyn OfficeDocumentReader>,
    pub model: Arc<dyn GenerativeModel>,
}

impl Capabilities {
    pub fn new(
        byte_store: Arc<dyn ByteStore>,
        document_understanding: Arc<dyn DocumentUnderstanding>,
        office_reader: Arc<dyn OfficeDocumentReader>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            byte_store,
            document_understanding,
            office_reader,
            model,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

/// Bound a capability call; an elapsed deadline becomes [`CapabilityError::Timeout`].
///
/// Dropping the inner future on timeout aborts the outstanding request.
pub(crate) async fn with_timeout<T, F>(secs: u64, fut: F) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(CapabilityError::Timeout { secs }),
    }
}
