//! Output types returned by the pipeline entry points.
//!
//! [`PipelineResult`] is the only value a caller of [`crate::Pipeline::run`]
//! ever receives: failures before extraction become `success: false`, and
//! everything after extraction degrades instead of failing.

use crate::error::{ErrorKind, StepName};
use crate::pipeline::classify::DocumentKind;
use crate::pipeline::strategy::{ExtractionAttempt, StrategyId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why one extraction attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl AttemptFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The result of running one strategy of the cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub attempt: ExtractionAttempt,
    pub succeeded: bool,
    pub text: Option<String>,
    pub failure: Option<AttemptFailure>,
}

impl ExtractionOutcome {
    pub fn success(attempt: ExtractionAttempt, text: String) -> Self {
        Self {
            attempt,
            succeeded: true,
            text: Some(text),
            failure: None,
        }
    }

    pub fn failure(attempt: ExtractionAttempt, failure: AttemptFailure) -> Self {
        Self {
            attempt,
            succeeded: false,
            text: None,
            failure: Some(failure),
        }
    }
}

/// The chosen outcome as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub strategy: StrategyId,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

impl From<&ExtractionOutcome> for ExtractionSummary {
    fn from(outcome: &ExtractionOutcome) -> Self {
        Self {
            strategy: outcome.attempt.strategy,
            succeeded: outcome.succeeded,
            failure_kind: outcome.failure.as_ref().map(|f| f.kind),
            failure_message: outcome.failure.as_ref().map(|f| f.message.clone()),
        }
    }
}

/// How the enrichment summary and tags were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// The model returned a well-formed JSON object.
    Generated,
    /// The JSON was invalid; at least one field was recovered by regex.
    Recovered,
    /// Nothing could be recovered; sentinel summary and empty tags.
    Defaulted,
    /// The model call failed (network, auth, quota, timeout).
    ModelFailed,
    /// The model refused for safety reasons.
    SafetyBlocked,
}

impl EnrichmentStatus {
    /// True for every status other than a clean generation.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, EnrichmentStatus::Generated)
    }
}

/// Summary and tags produced by the enrichment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub summary: String,
    /// Model order; duplicates are kept.
    pub tags: Vec<String>,
    pub status: EnrichmentStatus,
    /// The model answered but violated the JSON contract.
    pub contract_violation: bool,
}

/// Wall-clock timings of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub byte_length: usize,
    pub download_ms: u64,
    pub extract_ms: u64,
    pub enrich_ms: u64,
    pub total_ms: u64,
}

/// The normalized record of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    /// Full extracted text, never truncated. Empty only when `success` is false.
    pub extracted_text: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub document_kind: DocumentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Set if and only if `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_step: Option<StepName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_status: Option<EnrichmentStatus>,
    pub stats: RunStats,
}

impl PipelineResult {
    /// Extraction worked but enrichment fell back to sentinels or regex recovery.
    ///
    /// A different severity from `success == false`; do not conflate them.
    pub fn is_enrichment_degraded(&self) -> bool {
        self.success
            && self
                .enrichment_status
                .map(|s| s.is_degraded())
                .unwrap_or(false)
    }
}

/// Output of the custom-instruction variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomInstructionOutput {
    /// Fence-stripped, trimmed model answer.
    pub text: String,
    pub document_kind: DocumentKind,
    pub extraction: ExtractionSummary,
    pub stats: RunStats,
}

/// Terminal failure of the custom-instruction variant.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{step} failed ({kind}): {message}")]
pub struct PipelineFailure {
    pub step: StepName,
    pub kind: ErrorKind,
    pub message: String,
    pub document_kind: DocumentKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(strategy: StrategyId) -> ExtractionAttempt {
        ExtractionAttempt {
            strategy,
            ordinal: 0,
        }
    }

    #[test]
    fn summary_from_failed_outcome() {
        let outcome = ExtractionOutcome::failure(
            attempt(StrategyId::OfficeTextExtractor),
            AttemptFailure::new(ErrorKind::NoContent, "empty document"),
        );
        let summary = ExtractionSummary::from(&outcome);
        assert!(!summary.succeeded);
        assert_eq!(summary.failure_kind, Some(ErrorKind::NoContent));
    }

    #[test]
    fn degraded_statuses() {
        assert!(!EnrichmentStatus::Generated.is_degraded());
        assert!(EnrichmentStatus::Recovered.is_degraded());
        assert!(EnrichmentStatus::SafetyBlocked.is_degraded());
    }

    #[test]
    fn failure_display_names_step() {
        let f = PipelineFailure {
            step: StepName::Enrich,
            kind: ErrorKind::Unreachable,
            message: "timed out after 60s".into(),
            document_kind: DocumentKind::PlainText,
        };
        assert_eq!(f.to_string(), "enrich failed (unreachable): timed out after 60s");
    }
}
