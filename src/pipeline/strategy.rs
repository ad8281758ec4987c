//! Extraction strategy selection: `DocumentKind` → ordered cascade.
//!
//! The set of strategies is closed. Each tag maps to exactly one handler in
//! [`crate::pipeline::extract`], so the table below is exhaustive by
//! construction and there is no plugin registry to keep in sync.

use super::classify::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    /// Office reader capability.
    OfficeTextExtractor,
    /// OCR / layout-aware capability.
    DocumentUnderstandingService,
    /// Deterministic size-and-kind description; never fails.
    PlaceholderDescription,
    /// Local tag stripping.
    HtmlTextExtractor,
    /// Bytes decoded as UTF-8.
    RawPassthrough,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::OfficeTextExtractor => "office-text-extractor",
            StrategyId::DocumentUnderstandingService => "document-understanding-service",
            StrategyId::PlaceholderDescription => "placeholder-description",
            StrategyId::HtmlTextExtractor => "html-text-extractor",
            StrategyId::RawPassthrough => "raw-passthrough",
        }
    }

    /// Whether the strategy calls an external collaborator.
    pub fn is_capability_backed(&self) -> bool {
        matches!(
            self,
            StrategyId::OfficeTextExtractor | StrategyId::DocumentUnderstandingService
        )
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member of the cascade for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub strategy: StrategyId,
    /// Zero-based position in the cascade.
    pub ordinal: usize,
}

/// The strategy table.
pub fn strategies_for(kind: DocumentKind) -> &'static [StrategyId] {
    use StrategyId::*;
    match kind {
        // No fallback beyond the reader: a failure here surfaces as-is.
        DocumentKind::OfficeDocument => &[OfficeTextExtractor],
        DocumentKind::Pdf | DocumentKind::Image | DocumentKind::Unknown => {
            &[DocumentUnderstandingService, PlaceholderDescription]
        }
        DocumentKind::Html => &[HtmlTextExtractor],
        DocumentKind::PlainText => &[RawPassthrough],
    }
}

/// Build the ordered attempts for a kind.
pub fn select(kind: DocumentKind) -> Vec<ExtractionAttempt> {
    strategies_for(kind)
        .iter()
        .enumerate()
        .map(|(ordinal, &strategy)| ExtractionAttempt { strategy, ordinal })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_cascade() {
        for kind in DocumentKind::ALL {
            assert!(!select(kind).is_empty(), "{kind} has no cascade");
        }
    }

    #[test]
    fn ordinals_follow_table_order() {
        let attempts = select(DocumentKind::Pdf);
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].strategy, StrategyId::DocumentUnderstandingService);
        assert_eq!(attempts[0].ordinal, 0);
        assert_eq!(attempts[1].strategy, StrategyId::PlaceholderDescription);
        assert_eq!(attempts[1].ordinal, 1);
    }

    #[test]
    fn unknown_shares_the_pdf_cascade() {
        assert_eq!(
            strategies_for(DocumentKind::Unknown),
            strategies_for(DocumentKind::Image)
        );
        assert_eq!(
            strategies_for(DocumentKind::Unknown),
            strategies_for(DocumentKind::Pdf)
        );
    }

    #[test]
    fn local_kinds_are_single_step() {
        assert_eq!(strategies_for(DocumentKind::Html), &[StrategyId::HtmlTextExtractor]);
        assert_eq!(strategies_for(DocumentKind::PlainText), &[StrategyId::RawPassthrough]);
        assert_eq!(
            strategies_for(DocumentKind::OfficeDocument),
            &[StrategyId::OfficeTextExtractor]
        );
    }

    #[test]
    fn ids_serialise_kebab_case() {
        assert_eq!(
            serde_json::to_string(&StrategyId::DocumentUnderstandingService).unwrap(),
            "\"document-understanding-service\""
        );
        assert!(StrategyId::OfficeTextExtractor.is_capability_backed());
        assert!(!StrategyId::RawPassthrough.is_capability_backed());
    }
}
