//! Default capability adapters.
//!
//! | Capability | Adapter | Backing |
//! |------------|---------|---------|
//! | [`ByteStore`](crate::capability::ByteStore) | [`HttpByteStore`] | `reqwest` |
//! | [`DocumentUnderstanding`](crate::capability::DocumentUnderstanding) | [`VisionDocumentUnderstanding`] | pdfium + vision LLM |
//! | [`OfficeDocumentReader`](crate::capability::OfficeDocumentReader) | [`ZipOfficeReader`] | `zip` |
//! | [`GenerativeModel`](crate::capability::GenerativeModel) | [`LlmGenerativeModel`] | `edgequake-llm` |
//!
//! The vision backend and the generative model share one provider instance.

pub mod http;
pub mod llm;
pub mod office;
pub mod vision;

pub use http::HttpByteStore;
pub use llm::{resolve_provider, LlmGenerativeModel};
pub use office::ZipOfficeReader;
pub use vision::VisionDocumentUnderstanding;

use crate::capability::Capabilities;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use std::sync::Arc;

/// Build the production capability bundle from a configuration.
///
/// Fails when no LLM provider can be resolved or the HTTP client cannot be
/// built.
pub fn default_capabilities(config: &PipelineConfig) -> Result<Capabilities, PipelineError> {
    let provider = resolve_provider(config)?;
    let byte_store = HttpByteStore::new(config.download_timeout_secs)
        .map_err(|e| PipelineError::Internal(format!("HTTP client: {e}")))?;

    Ok(Capabilities::new(
        Arc::new(byte_store),
        Arc::new(VisionDocumentUnderstanding::new(
            Arc::clone(&provider),
            config.vision_max_pages,
            config.max_rendered_pixels,
            config.concurrency,
        )),
        Arc::new(ZipOfficeReader),
        Arc::new(LlmGenerativeModel::new(
            provider,
            config.temperature,
            config.max_tokens,
        )),
    ))
}
