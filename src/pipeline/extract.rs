//! Extraction executor: run the cascade, first success wins.
//!
//! Attempts run strictly in ordinal order. A capability-backed attempt is
//! bounded by `extraction_timeout_secs`; an elapsed deadline, a capability
//! error and an empty result are all recorded as a failed outcome and the
//! next attempt runs. Local strategies (placeholder, HTML, raw) cannot fail
//! except for empty input.
//!
//! When every attempt fails the last outcome is the chosen one. Deciding
//! whether that ends the run is the caller's business.

use super::classify::DocumentKind;
use super::html::html_to_text;
use super::strategy::{ExtractionAttempt, StrategyId};
use crate::capability::{with_timeout, Capabilities};
use crate::error::{CapabilityError, ErrorKind, PipelineError};
use crate::output::{AttemptFailure, ExtractionOutcome};
use crate::progress::PipelineObserver;
use tracing::{debug, info, warn};

/// Every outcome of a cascade plus the index of the one that counts.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Index into `outcomes` of the chosen outcome.
    pub chosen: usize,
    /// One entry per attempt that actually ran, in order.
    pub outcomes: Vec<ExtractionOutcome>,
}

impl ExtractionReport {
    pub fn chosen_outcome(&self) -> &ExtractionOutcome {
        &self.outcomes[self.chosen]
    }

    pub fn succeeded(&self) -> bool {
        self.chosen_outcome().succeeded
    }

    /// Text of the chosen outcome, if it succeeded.
    pub fn text(&self) -> Option<&str> {
        self.chosen_outcome().text.as_deref()
    }
}

/// Run `attempts` against `bytes` until one yields non-empty text.
///
/// Returns [`PipelineError::UnsupportedKind`] only when `attempts` is empty.
pub async fn execute(
    bytes: &[u8],
    kind: DocumentKind,
    attempts: &[ExtractionAttempt],
    caps: &Capabilities,
    timeout_secs: u64,
    observer: Option<&dyn PipelineObserver>,
) -> Result<ExtractionReport, PipelineError> {
    if attempts.is_empty() {
        return Err(PipelineError::UnsupportedKind {
            kind: kind.label().to_string(),
        });
    }

    let mut outcomes: Vec<ExtractionOutcome> = Vec::with_capacity(attempts.len());

    for attempt in attempts {
        let prior = outcomes.last().and_then(|o| o.failure.as_ref());
        if attempt.strategy.is_capability_backed() {
            debug!(
                "Extraction attempt {} ({}, {}s budget)",
                attempt.ordinal, attempt.strategy, timeout_secs
            );
        } else {
            debug!("Extraction attempt {} ({})", attempt.ordinal, attempt.strategy);
        }

        let result = run_strategy(attempt.strategy, bytes, kind, caps, timeout_secs, prior).await;
        let outcome = match result {
            Ok(text) if !text.trim().is_empty() => ExtractionOutcome::success(*attempt, text),
            Ok(_) => ExtractionOutcome::failure(
                *attempt,
                AttemptFailure::new(ErrorKind::NoContent, format!("{} returned no text", attempt.strategy)),
            ),
            Err(e) => {
                warn!("{} failed: {}", attempt.strategy, e);
                ExtractionOutcome::failure(*attempt, AttemptFailure::new(e.kind(), e.to_string()))
            }
        };

        if let Some(obs) = observer {
            obs.on_attempt_complete(&outcome);
        }

        let done = outcome.succeeded;
        outcomes.push(outcome);
        if done {
            info!(
                "Extracted text with {} ({} attempt(s))",
                attempt.strategy,
                outcomes.len()
            );
            break;
        }
    }

    Ok(ExtractionReport {
        chosen: outcomes.len() - 1,
        outcomes,
    })
}

async fn run_strategy(
    strategy: StrategyId,
    bytes: &[u8],
    kind: DocumentKind,
    caps: &Capabilities,
    timeout_secs: u64,
    prior: Option<&AttemptFailure>,
) -> Result<String, CapabilityError> {
    match strategy {
        StrategyId::OfficeTextExtractor => {
            with_timeout(timeout_secs, caps.office_reader.extract_raw_text(bytes)).await
        }
        StrategyId::DocumentUnderstandingService => {
            with_timeout(timeout_secs, caps.document_understanding.extract(bytes, kind)).await
        }
        StrategyId::PlaceholderDescription => Ok(placeholder_text(kind, bytes.len(), prior)),
        StrategyId::HtmlTextExtractor => Ok(html_to_text(&decode_text(bytes))),
        StrategyId::RawPassthrough => Ok(decode_text(bytes)),
    }
}

/// Lossy UTF-8 decode with a leading byte-order mark removed.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Deterministic description used when the understanding service gives nothing.
pub fn placeholder_text(kind: DocumentKind, byte_len: usize, prior: Option<&AttemptFailure>) -> String {
    let reason = match prior {
        Some(f) if f.kind == ErrorKind::NoContent => {
            "The primary extraction service returned no text".to_string()
        }
        Some(f) => format!(
            "The primary extraction service was unavailable: {}",
            f.message.trim_end_matches('.')
        ),
        None => "No extraction service was available".to_string(),
    };
    format!(
        "This is placeholder text for a {} document of approximately {} bytes. {}.",
        kind.label(),
        byte_len,
        reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        ByteStore, DocumentUnderstanding, FetchedBytes, GenerativeModel, OfficeDocumentReader,
    };
    use crate::pipeline::strategy::select;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct NoStore;

    #[async_trait]
    impl ByteStore for NoStore {
        async fn fetch(&self, _url: &str) -> Result<FetchedBytes, CapabilityError> {
            Err(CapabilityError::Unavailable("no network in tests".into()))
        }
    }

    enum Behaviour {
        Text(&'static str),
        Fail(CapabilityError),
        Hang,
    }

    struct FakeUnderstanding(Behaviour, AtomicUsize);

    #[async_trait]
    impl DocumentUnderstanding for FakeUnderstanding {
        async fn extract(&self, _bytes: &[u8], _kind: DocumentKind) -> Result<String, CapabilityError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            match &self.0 {
                Behaviour::Text(t) => Ok(t.to_string()),
                Behaviour::Fail(e) => Err(e.clone()),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".into())
                }
            }
        }
    }

    struct FakeOffice(Result<String, CapabilityError>);

    #[async_trait]
    impl OfficeDocumentReader for FakeOffice {
        async fn extract_raw_text(&self, _bytes: &[u8]) -> Result<String, CapabilityError> {
            self.0.clone()
        }
    }

    struct NoModel;

    #[async_trait]
    impl GenerativeModel for NoModel {
        async fn complete(&self, _prompt: &str) -> Result<String, CapabilityError> {
            Err(CapabilityError::Unavailable("unused".into()))
        }
    }

    fn caps(understanding: Behaviour, office: Result<String, CapabilityError>) -> Capabilities {
        Capabilities::new(
            Arc::new(NoStore),
            Arc::new(FakeUnderstanding(understanding, AtomicUsize::new(0))),
            Arc::new(FakeOffice(office)),
            Arc::new(NoModel),
        )
    }

    async fn run(kind: DocumentKind, bytes: &[u8], caps: &Capabilities) -> ExtractionReport {
        execute(bytes, kind, &select(kind), caps, 1, None).await.unwrap()
    }

    #[tokio::test]
    async fn understanding_success_stops_cascade() {
        let c = caps(Behaviour::Text("Jane Doe\nRegistered Nurse"), Ok(String::new()));
        let report = run(DocumentKind::Pdf, b"%PDF-1.7", &c).await;
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.text(), Some("Jane Doe\nRegistered Nurse"));
        assert_eq!(report.chosen_outcome().attempt.strategy, StrategyId::DocumentUnderstandingService);
    }

    #[tokio::test]
    async fn understanding_timeout_falls_back_to_placeholder() {
        let c = caps(Behaviour::Hang, Ok(String::new()));
        let report = run(DocumentKind::Pdf, &[0u8; 2048], &c).await;
        assert_eq!(report.outcomes.len(), 2);
        assert!(!report.outcomes[0].succeeded);
        assert_eq!(
            report.outcomes[0].failure.as_ref().map(|f| f.kind),
            Some(ErrorKind::Unreachable)
        );
        assert!(report.succeeded());
        let text = report.text().unwrap();
        assert!(text.contains("pdf document"));
        assert!(text.contains("2048 bytes"));
        assert!(text.contains("timed out after 1s"));
    }

    #[tokio::test]
    async fn empty_understanding_result_is_no_content() {
        let c = caps(Behaviour::Text("  \n "), Ok(String::new()));
        let report = run(DocumentKind::Image, b"\xFF\xD8\xFF", &c).await;
        assert_eq!(
            report.outcomes[0].failure.as_ref().map(|f| f.kind),
            Some(ErrorKind::NoContent)
        );
        assert!(report.text().unwrap().contains("returned no text"));
    }

    #[tokio::test]
    async fn office_failure_has_no_fallback() {
        let c = caps(
            Behaviour::Text("unused"),
            Err(CapabilityError::Failed("not a valid package".into())),
        );
        let report = run(DocumentKind::OfficeDocument, b"PK\x03\x04", &c).await;
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.succeeded());
        assert_eq!(report.text(), None);
    }

    #[tokio::test]
    async fn html_and_raw_are_local() {
        let c = caps(Behaviour::Fail(CapabilityError::Unavailable("down".into())), Ok(String::new()));
        let report = run(DocumentKind::Html, b"<p>Hello &amp; welcome</p>", &c).await;
        assert_eq!(report.text(), Some("Hello & welcome"));

        let report = run(DocumentKind::PlainText, b"\xEF\xBB\xBFcaf\xC3\xA9 \xFF", &c).await;
        assert_eq!(report.text(), Some("café \u{FFFD}"));
    }

    #[tokio::test]
    async fn empty_plain_text_fails_with_no_content() {
        let c = caps(Behaviour::Text("unused"), Ok(String::new()));
        let report = run(DocumentKind::PlainText, b"", &c).await;
        assert!(!report.succeeded());
        assert_eq!(
            report.chosen_outcome().failure.as_ref().map(|f| f.kind),
            Some(ErrorKind::NoContent)
        );
    }

    #[tokio::test]
    async fn empty_cascade_is_unsupported() {
        let c = caps(Behaviour::Text("unused"), Ok(String::new()));
        let err = execute(b"x", DocumentKind::Unknown, &[], &c, 1, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedKind);
    }

    #[test]
    fn placeholder_without_prior_failure() {
        let text = placeholder_text(DocumentKind::Unknown, 10, None);
        assert_eq!(
            text,
            "This is placeholder text for a unknown document of approximately 10 bytes. No extraction service was available."
        );
    }
}
