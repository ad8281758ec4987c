//! Result normalization: fold stage outputs into one [`PipelineResult`].
//!
//! Two shapes only. A run that produced text (or a best-effort description of
//! why it could not) is `success: true` with summary and tags. A run that
//! failed before extraction is `success: false` with the failing step, the
//! error kind and a message; its text, summary and tags are empty.

use super::classify::DocumentKind;
use super::extract::ExtractionReport;
use crate::error::{PipelineError, StepName};
use crate::output::{
    AttemptFailure, EnrichmentResult, ExtractionSummary, PipelineResult, RunStats,
};

/// Text handed to enrichment and returned to the caller.
///
/// The chosen outcome's text when extraction succeeded, otherwise a
/// description of the document and the last failure.
pub fn extracted_text(report: &ExtractionReport, kind: DocumentKind, byte_len: usize) -> String {
    match report.text() {
        Some(text) => text.to_string(),
        None => unextracted_description(kind, byte_len, report.chosen_outcome().failure.as_ref()),
    }
}

/// Description used when every extraction attempt failed.
pub fn unextracted_description(
    kind: DocumentKind,
    byte_len: usize,
    failure: Option<&AttemptFailure>,
) -> String {
    let reason = failure
        .map(|f| f.message.trim_end_matches('.').to_string())
        .unwrap_or_else(|| "no strategy produced text".to_string());
    format!(
        "No text could be extracted from this {} document of approximately {} bytes ({}).",
        kind.label(),
        byte_len,
        reason
    )
}

/// Build the success record.
pub fn success(
    text: String,
    report: &ExtractionReport,
    enrichment: EnrichmentResult,
    kind: DocumentKind,
    file_name: Option<String>,
    stats: RunStats,
) -> PipelineResult {
    PipelineResult {
        success: true,
        extracted_text: text,
        summary: enrichment.summary,
        tags: enrichment.tags,
        document_kind: kind,
        file_name,
        failure_step: None,
        error_kind: None,
        error_message: None,
        extraction: Some(ExtractionSummary::from(report.chosen_outcome())),
        enrichment_status: Some(enrichment.status),
        stats,
    }
}

/// Build the failure record for an error raised at `step`.
pub fn failure(
    step: StepName,
    error: &PipelineError,
    kind: DocumentKind,
    file_name: Option<String>,
    stats: RunStats,
) -> PipelineResult {
    PipelineResult {
        success: false,
        extracted_text: String::new(),
        summary: String::new(),
        tags: Vec::new(),
        document_kind: kind,
        file_name,
        failure_step: Some(step),
        error_kind: Some(error.kind()),
        error_message: Some(error.to_string()),
        extraction: None,
        enrichment_status: None,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::output::{EnrichmentStatus, ExtractionOutcome};
    use crate::pipeline::strategy::{ExtractionAttempt, StrategyId};

    fn office_failure_report() -> ExtractionReport {
        ExtractionReport {
            chosen: 0,
            outcomes: vec![ExtractionOutcome::failure(
                ExtractionAttempt {
                    strategy: StrategyId::OfficeTextExtractor,
                    ordinal: 0,
                },
                AttemptFailure::new(ErrorKind::Unreachable, "not a valid office package."),
            )],
        }
    }

    #[test]
    fn failed_extraction_is_described() {
        let report = office_failure_report();
        let text = extracted_text(&report, DocumentKind::OfficeDocument, 512);
        assert_eq!(
            text,
            "No text could be extracted from this office document of approximately 512 bytes (not a valid office package)."
        );
    }

    #[test]
    fn success_carries_chosen_outcome() {
        let report = office_failure_report();
        let enrichment = EnrichmentResult {
            summary: "S".into(),
            tags: vec!["a".into()],
            status: EnrichmentStatus::Generated,
            contract_violation: false,
        };
        let r = success(
            "text".into(),
            &report,
            enrichment,
            DocumentKind::OfficeDocument,
            Some("cv.docx".into()),
            RunStats::default(),
        );
        assert!(r.success);
        assert!(r.failure_step.is_none());
        let extraction = r.extraction.unwrap();
        assert_eq!(extraction.strategy, StrategyId::OfficeTextExtractor);
        assert!(!extraction.succeeded);
    }

    #[test]
    fn failure_has_step_and_empty_fields() {
        let err = PipelineError::DownloadFailed {
            url: "https://x/missing.pdf".into(),
            reason: "HTTP 404".into(),
            status: Some(404),
        };
        let r = failure(
            StepName::Download,
            &err,
            DocumentKind::Unknown,
            None,
            RunStats::default(),
        );
        assert!(!r.success);
        assert_eq!(r.failure_step, Some(StepName::Download));
        assert_eq!(r.error_kind, Some(ErrorKind::Unreachable));
        assert!(r.extracted_text.is_empty());
        assert!(r.summary.is_empty());
        assert!(r.tags.is_empty());
    }
}
