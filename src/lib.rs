//! # edgequake-docenrich
//!
//! Turn an arbitrary uploaded document into plain text plus a short summary
//! and a handful of tags, using a document-understanding backend and a
//! generative language model.
//!
//! ## Why this crate?
//!
//! Uploads arrive as PDFs, scans, Word files, web pages and text, from URLs,
//! data URIs or memory. Each format needs a different extractor, and the
//! fancy ones (OCR, vision models) are slow and fail. This crate classifies
//! the bytes, runs an ordered cascade of extraction strategies with a
//! never-failing fallback, and asks the model for a summary it parses
//! defensively. The caller always gets one normalized record back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DocumentRef
//!  │
//!  ├─ 1. Download  URL GET / data-URI decode / in-memory bytes
//!  ├─ 2. Classify  declared type → extension → magic bytes
//!  ├─ 3. Extract   strategy cascade, first non-empty text wins
//!  ├─ 4. Enrich    one model call; JSON → regex → sentinel parsing
//!  └─ 5. Result    PipelineResult { success, extracted_text, summary, tags, … }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docenrich::{DocumentRef, Pipeline, PipelineConfig, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let pipeline = Pipeline::from_config(PipelineConfig::default())?;
//!     let result = pipeline
//!         .run(DocumentRef::url("https://example.com/resume.pdf"), &RunOptions::default())
//!         .await;
//!     if result.success {
//!         println!("{}\n{:?}", result.summary, result.tags);
//!     } else {
//!         eprintln!("{:?} failed: {:?}", result.failure_step, result.error_message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a network
//!
//! Every external collaborator is a trait in [`capability`]. Build a
//! [`Pipeline`] with [`Pipeline::new`] and a [`Capabilities`] bundle of fakes.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docenrich` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docenrich = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod capability;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capability::{
    ByteStore, Capabilities, DocumentUnderstanding, FetchedBytes, GenerativeModel,
    OfficeDocumentReader,
};
pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_ENRICHMENT_CHAR_CAP};
pub use error::{CapabilityError, ErrorKind, PipelineError, StepName};
pub use output::{
    CustomInstructionOutput, EnrichmentResult, EnrichmentStatus, ExtractionSummary,
    PipelineFailure, PipelineResult, RunStats,
};
pub use pipeline::classify::DocumentKind;
pub use pipeline::input::DocumentRef;
pub use pipeline::strategy::StrategyId;
pub use progress::{NoopObserver, PipelineObserver};
pub use run::{run_sync, Pipeline, RunOptions};
pub use stream::run_stream;
