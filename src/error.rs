//! Error types for the edgequake-docenrich library.
//!
//! Three layers reflect three distinct failure modes:
//!
//! * [`PipelineError`]: **Fatal to a run**: the document reference cannot be
//!   turned into bytes (bad data URI, unreachable URL) or the configuration is
//!   unusable. The public entry points never return it directly; the result
//!   normalizer folds it into a `success: false` [`crate::output::PipelineResult`].
//!
//! * [`CapabilityError`]: **Non-fatal**: one external collaborator (download,
//!   OCR backend, office reader, language model) failed. Extraction records it
//!   in the attempt outcome and moves to the next strategy; enrichment turns
//!   it into a sentinel result.
//!
//! * [`ErrorKind`]: the small public taxonomy callers branch on. Every error
//!   above maps onto exactly one kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Public error taxonomy. Kinds, not types: callers branch on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The document reference itself cannot be parsed.
    MalformedInput,
    /// A remote fetch or capability call could not complete.
    Unreachable,
    /// No extraction cascade exists for the classified kind.
    UnsupportedKind,
    /// The model answered, but not in the requested format. Always recovered.
    ModelContractViolation,
    /// A strategy ran but produced no usable text: empty output, or input
    /// the backend cannot read.
    NoContent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::UnsupportedKind => "unsupported_kind",
            ErrorKind::ModelContractViolation => "model_contract_violation",
            ErrorKind::NoContent => "no_content",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named pipeline stage that produced a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepName {
    Download,
    Classify,
    Extract,
    Enrich,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Download => "download",
            StepName::Classify => "classify",
            StepName::Extract => "extract",
            StepName::Enrich => "enrich",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a run before any text exists.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The URL reference is not an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// A `data:` URI without the `;base64,` marker.
    #[error("Malformed data URI: {reason}")]
    MalformedDataUri { reason: String },

    /// The data URI payload is not valid base64.
    #[error("Data URI payload is not valid base64: {detail}")]
    InvalidBase64 { detail: String },

    /// The URL could not be fetched (transport error or non-2xx status).
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed {
        url: String,
        reason: String,
        status: Option<u16>,
    },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Classification ────────────────────────────────────────────────────
    /// The strategy table produced no entry for this kind.
    #[error("No extraction strategy is defined for document kind '{kind}'")]
    UnsupportedKind { kind: String },

    // ── Setup ─────────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Map onto the public taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput { .. }
            | PipelineError::MalformedDataUri { .. }
            | PipelineError::InvalidBase64 { .. }
            | PipelineError::InvalidConfig(_) => ErrorKind::MalformedInput,
            PipelineError::DownloadFailed { .. }
            | PipelineError::DownloadTimeout { .. }
            | PipelineError::ProviderNotConfigured { .. }
            | PipelineError::Internal(_) => ErrorKind::Unreachable,
            PipelineError::UnsupportedKind { .. } => ErrorKind::UnsupportedKind,
        }
    }

    /// HTTP status carried by a failed download, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PipelineError::DownloadFailed { status, .. } => *status,
            _ => None,
        }
    }
}

/// A failure reported by (or on behalf of) an external collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityError {
    /// The backend is not installed or not configured.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its time budget.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The remote answered with a non-success HTTP status.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Network-level failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The model refused to answer for safety reasons.
    #[error("blocked by safety filters: {0}")]
    SafetyBlocked(String),

    /// The backend does not handle this input.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// Any other backend failure.
    #[error("{0}")]
    Failed(String),
}

impl CapabilityError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CapabilityError::Timeout { .. })
    }

    pub fn is_safety_block(&self) -> bool {
        matches!(self, CapabilityError::SafetyBlocked(_))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CapabilityError::Unsupported(_) => ErrorKind::NoContent,
            _ => ErrorKind::Unreachable,
        }
    }
}
