//! Pipeline entry points.
//!
//! [`Pipeline::run`] is the primary API: it always returns a
//! [`PipelineResult`], never an error. A run that cannot obtain bytes comes
//! back with `success: false` and `failure_step: download`; everything after
//! that degrades instead of failing.
//!
//! ```text
//! DocumentRef ─▶ download ─▶ classify ─▶ extract ─▶ enrich ─▶ PipelineResult
//! ```
//!
//! One `Pipeline` may serve many concurrent runs. Each run owns its buffers
//! and shares only the read-only capabilities and configuration.

use crate::backend::default_capabilities;
use crate::capability::Capabilities;
use crate::config::PipelineConfig;
use crate::error::{ErrorKind, PipelineError, StepName};
use crate::output::{
    CustomInstructionOutput, ExtractionSummary, PipelineFailure, PipelineResult, RunStats,
};
use crate::pipeline::classify::{classify, DocumentKind};
use crate::pipeline::enrich::{enrich, enrich_with_instruction, EnrichmentRequest};
use crate::pipeline::extract::{execute, ExtractionReport};
use crate::pipeline::input::{file_name_from_url, resolve, DocumentRef};
use crate::pipeline::normalize;
use crate::pipeline::strategy::select;
use crate::progress::PipelineObserver;
use std::time::Instant;
use tracing::{info, warn};

/// Bytes of the buffer head used for magic-byte sniffing.
const SNIFF_LEN: usize = 512;

/// Per-run hints that are not part of the document reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// MIME type or bare extension; wins over anything the source declares.
    pub declared_type: Option<String>,
    /// Display name; wins over a name derived from the reference.
    pub file_name: Option<String>,
}

impl RunOptions {
    pub fn with_declared_type(mut self, declared: impl Into<String>) -> Self {
        self.declared_type = Some(declared.into());
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// State shared by both entry points once extraction has finished.
struct Extracted {
    kind: DocumentKind,
    file_name: Option<String>,
    text: String,
    report: ExtractionReport,
}

/// Where a run stopped before extraction finished.
struct EarlyFailure {
    step: StepName,
    error: PipelineError,
    kind: DocumentKind,
    file_name: Option<String>,
}

/// The extraction-and-enrichment pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    capabilities: Capabilities,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build a pipeline over explicit capabilities.
    pub fn new(capabilities: Capabilities, config: PipelineConfig) -> Self {
        Self {
            capabilities,
            config,
        }
    }

    /// Build a pipeline over the default adapters in [`crate::backend`].
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let capabilities = default_capabilities(&config)?;
        Ok(Self::new(capabilities, config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn observer(&self) -> Option<&dyn PipelineObserver> {
        self.config.observer.as_deref()
    }

    fn stage(&self, step: StepName) {
        if let Some(obs) = self.observer() {
            obs.on_stage_start(step);
        }
    }

    /// Extract, summarize and tag one document.
    pub async fn run(&self, doc: DocumentRef, opts: &RunOptions) -> PipelineResult {
        let total_start = Instant::now();
        let mut stats = RunStats::default();
        info!("Starting run: {}", doc.describe());

        let result = match self.extract(doc, opts, &mut stats).await {
            Err(early) => {
                stats.total_ms = total_start.elapsed().as_millis() as u64;
                warn!("Run failed at {}: {}", early.step, early.error);
                normalize::failure(
                    early.step,
                    &early.error,
                    early.kind,
                    early.file_name,
                    stats,
                )
            }
            Ok(extracted) => {
                self.stage(StepName::Enrich);
                let enrich_start = Instant::now();
                let request = EnrichmentRequest::new(
                    &extracted.text,
                    extracted.kind,
                    extracted.file_name.clone(),
                    self.config.enrichment_char_cap,
                );
                let enrichment = enrich(
                    self.capabilities.model.as_ref(),
                    &request,
                    self.config.model_timeout_secs,
                )
                .await;
                stats.enrich_ms = enrich_start.elapsed().as_millis() as u64;
                stats.total_ms = total_start.elapsed().as_millis() as u64;

                info!(
                    "Run complete: {} ({} chars, enrichment {:?}, {}ms)",
                    extracted.kind,
                    extracted.text.chars().count(),
                    enrichment.status,
                    stats.total_ms
                );
                normalize::success(
                    extracted.text,
                    &extracted.report,
                    enrichment,
                    extracted.kind,
                    extracted.file_name,
                    stats,
                )
            }
        };

        if let Some(obs) = self.observer() {
            obs.on_run_complete(&result);
        }
        result
    }

    /// Extract one document, then answer a caller-supplied instruction about it.
    ///
    /// Every `{text}` in `instruction_template` is replaced by the extracted
    /// text (capped like the enrichment input). Unlike [`Pipeline::run`], a
    /// failed model call is returned as an error.
    pub async fn run_with_custom_instruction(
        &self,
        doc: DocumentRef,
        opts: &RunOptions,
        instruction_template: &str,
    ) -> Result<CustomInstructionOutput, PipelineFailure> {
        let total_start = Instant::now();
        let mut stats = RunStats::default();
        info!("Starting custom-instruction run: {}", doc.describe());

        let extracted = self.extract(doc, opts, &mut stats).await.map_err(|early| {
            PipelineFailure {
                step: early.step,
                kind: early.error.kind(),
                message: early.error.to_string(),
                document_kind: early.kind,
            }
        })?;

        self.stage(StepName::Enrich);
        let enrich_start = Instant::now();
        let text = enrich_with_instruction(
            self.capabilities.model.as_ref(),
            instruction_template,
            &extracted.text,
            self.config.enrichment_char_cap,
            self.config.model_timeout_secs,
        )
        .await
        .map_err(|e| {
            warn!("Custom instruction failed: {}", e);
            PipelineFailure {
                step: StepName::Enrich,
                kind: ErrorKind::Unreachable,
                message: e.to_string(),
                document_kind: extracted.kind,
            }
        })?;
        stats.enrich_ms = enrich_start.elapsed().as_millis() as u64;
        stats.total_ms = total_start.elapsed().as_millis() as u64;

        Ok(CustomInstructionOutput {
            text,
            document_kind: extracted.kind,
            extraction: ExtractionSummary::from(extracted.report.chosen_outcome()),
            stats,
        })
    }

    /// Download, classify and extract.
    async fn extract(
        &self,
        doc: DocumentRef,
        opts: &RunOptions,
        stats: &mut RunStats,
    ) -> Result<Extracted, EarlyFailure> {
        let hinted_name = opts.file_name.clone().or_else(|| reference_name(&doc));

        // ── Download ─────────────────────────────────────────────────────
        self.stage(StepName::Download);
        let download_start = Instant::now();
        let resolved = resolve(
            doc,
            self.capabilities.byte_store.as_ref(),
            self.config.download_timeout_secs,
        )
        .await
        .map_err(|error| EarlyFailure {
            step: StepName::Download,
            error,
            kind: DocumentKind::Unknown,
            file_name: hinted_name.clone(),
        })?;
        stats.download_ms = download_start.elapsed().as_millis() as u64;
        stats.byte_length = resolved.content_length;

        // ── Classify ─────────────────────────────────────────────────────
        self.stage(StepName::Classify);
        let declared = opts
            .declared_type
            .as_deref()
            .or(resolved.declared_mime.as_deref());
        let file_name = hinted_name.or(resolved.file_name);
        let head = &resolved.bytes[..resolved.bytes.len().min(SNIFF_LEN)];
        let kind = classify(declared, file_name.as_deref(), Some(head));
        let attempts = select(kind);
        info!(
            "Classified {} bytes as {} ({} strategies)",
            resolved.content_length,
            kind,
            attempts.len()
        );

        // ── Extract ──────────────────────────────────────────────────────
        self.stage(StepName::Extract);
        let extract_start = Instant::now();
        let report = execute(
            &resolved.bytes,
            kind,
            &attempts,
            &self.capabilities,
            self.config.extraction_timeout_secs,
            self.observer(),
        )
        .await
        .map_err(|error| EarlyFailure {
            step: StepName::Classify,
            error,
            kind,
            file_name: file_name.clone(),
        })?;
        stats.extract_ms = extract_start.elapsed().as_millis() as u64;

        for outcome in &report.outcomes {
            if let Some(failure) = &outcome.failure {
                warn!(
                    "Attempt {} ({}) failed: {} ({})",
                    outcome.attempt.ordinal, outcome.attempt.strategy, failure.message, failure.kind
                );
            }
        }

        let text = normalize::extracted_text(&report, kind, resolved.content_length);
        Ok(Extracted {
            kind,
            file_name,
            text,
            report,
        })
    }
}

/// File name carried by the reference itself.
fn reference_name(doc: &DocumentRef) -> Option<String> {
    match doc {
        DocumentRef::Url(url) => file_name_from_url(url),
        DocumentRef::Bytes { file_name, .. } => file_name.clone(),
        DocumentRef::DataUri(_) => None,
    }
}

/// Synchronous wrapper around [`Pipeline::run`].
///
/// Creates a temporary tokio runtime internally. Do not call from inside an
/// async context.
pub fn run_sync(
    pipeline: &Pipeline,
    doc: DocumentRef,
    opts: &RunOptions,
) -> Result<PipelineResult, PipelineError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PipelineError::Internal(format!("Failed to create tokio runtime: {}", e)))
        .map(|rt| rt.block_on(pipeline.run(doc, opts)))
}
