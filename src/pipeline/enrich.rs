//! Enrichment: ask the generative model for a summary and tags.
//!
//! The model sees at most `enrichment_char_cap` characters of the extracted
//! text. The call is made exactly once; every failure mode degrades to a
//! sentinel [`EnrichmentResult`] so a run that got this far always succeeds.

use super::classify::DocumentKind;
use super::response::{clean_response, parse_enrichment};
use crate::capability::{with_timeout, GenerativeModel};
use crate::error::CapabilityError;
use crate::output::{EnrichmentResult, EnrichmentStatus};
use crate::prompts::{apply_instruction_template, enrichment_prompt};
use tracing::{debug, warn};

/// Summary returned when the model call itself failed.
pub const SUMMARY_MODEL_FAILED: &str =
    "Summary unavailable: the document could not be processed by the language model.";

/// Summary returned when the model refused for safety reasons.
pub const SUMMARY_SAFETY_BLOCKED: &str = "Content was blocked by the model's safety filters.";

/// What the model is asked to describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRequest {
    /// Extracted text, already truncated to the cap.
    pub text: String,
    pub document_kind: DocumentKind,
    pub document_name: Option<String>,
    /// Whether `text` was cut short.
    pub truncated: bool,
}

impl EnrichmentRequest {
    pub fn new(
        full_text: &str,
        document_kind: DocumentKind,
        document_name: Option<String>,
        char_cap: usize,
    ) -> Self {
        let (text, truncated) = truncate_chars(full_text, char_cap);
        Self {
            text: text.to_string(),
            document_kind,
            document_name,
            truncated,
        }
    }
}

/// First `cap` characters of `text` (not bytes), and whether anything was cut.
pub fn truncate_chars(text: &str, cap: usize) -> (&str, bool) {
    match text.char_indices().nth(cap) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Summarize and tag. Never fails.
pub async fn enrich(
    model: &dyn GenerativeModel,
    request: &EnrichmentRequest,
    timeout_secs: u64,
) -> EnrichmentResult {
    if request.truncated {
        debug!(
            "Enrichment input truncated to {} chars",
            request.text.chars().count()
        );
    }

    let prompt = enrichment_prompt(request);
    match with_timeout(timeout_secs, model.complete(&prompt)).await {
        Ok(raw) => parse_enrichment(&raw),
        Err(e) => {
            warn!("Enrichment model call failed: {}", e);
            degraded_result(&e)
        }
    }
}

/// Apply a caller-supplied template and return the cleaned answer.
///
/// Unlike [`enrich`] a model failure is returned to the caller.
pub async fn enrich_with_instruction(
    model: &dyn GenerativeModel,
    template: &str,
    full_text: &str,
    char_cap: usize,
    timeout_secs: u64,
) -> Result<String, CapabilityError> {
    let (text, _) = truncate_chars(full_text, char_cap);
    let prompt = apply_instruction_template(template, text);
    let raw = with_timeout(timeout_secs, model.complete(&prompt)).await?;
    Ok(clean_response(&raw))
}

/// Sentinel result for a failed model call.
pub fn degraded_result(error: &CapabilityError) -> EnrichmentResult {
    if is_safety_block(error) {
        EnrichmentResult {
            summary: SUMMARY_SAFETY_BLOCKED.to_string(),
            tags: vec!["error".into(), "safety_blocked".into()],
            status: EnrichmentStatus::SafetyBlocked,
            contract_violation: false,
        }
    } else {
        EnrichmentResult {
            summary: SUMMARY_MODEL_FAILED.to_string(),
            tags: vec!["error".into(), "processing_failed".into()],
            status: EnrichmentStatus::ModelFailed,
            contract_violation: false,
        }
    }
}

fn is_safety_block(error: &CapabilityError) -> bool {
    error.is_safety_block() || error.to_string().to_uppercase().contains("SAFETY")
}
