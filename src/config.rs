//! Configuration types for the extraction-and-enrichment pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The config carries only knobs: the external
//! collaborators themselves are injected separately through
//! [`crate::capability::Capabilities`], so tests can substitute fakes per run.

use crate::error::PipelineError;
use crate::progress::ObserverHandle;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default cap on the characters sent to the enrichment model.
pub const DEFAULT_ENRICHMENT_CHAR_CAP: usize = 8000;

/// Configuration for a pipeline run.
///
/// # Example
/// ```rust
/// use edgequake_docenrich::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .enrichment_char_cap(4000)
///     .model_timeout_secs(30)
///     .model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// assert_eq!(config.enrichment_char_cap, 4000);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Maximum characters of extracted text sent to the model. Default: 8000.
    ///
    /// Applied to the enrichment request only; the extracted text returned to
    /// the caller is never truncated.
    pub enrichment_char_cap: usize,

    /// Timeout for the remote byte download in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for each capability-backed extraction attempt in seconds. Default: 120.
    ///
    /// When it elapses the attempt counts as failed and the cascade moves on.
    pub extraction_timeout_secs: u64,

    /// Timeout for the generative-model call in seconds. Default: 60.
    pub model_timeout_secs: u64,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for enrichment completions. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 1024.
    pub max_tokens: usize,

    /// PDF pages the vision backend rasterises and transcribes. Default: 10.
    pub vision_max_pages: usize,

    /// Longest edge of a rasterised PDF page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Number of documents processed at once by [`crate::stream::run_stream`]. Default: 4.
    pub concurrency: usize,

    /// Optional stage/attempt event sink.
    pub observer: Option<ObserverHandle>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enrichment_char_cap: DEFAULT_ENRICHMENT_CHAR_CAP,
            download_timeout_secs: 120,
            extraction_timeout_secs: 120,
            model_timeout_secs: 60,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 1024,
            vision_max_pages: 10,
            max_rendered_pixels: 2000,
            concurrency: 4,
            observer: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("enrichment_char_cap", &self.enrichment_char_cap)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("extraction_timeout_secs", &self.extraction_timeout_secs)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("vision_max_pages", &self.vision_max_pages)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("concurrency", &self.concurrency)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn enrichment_char_cap(mut self, chars: usize) -> Self {
        self.config.enrichment_char_cap = chars;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = secs;
        self
    }

    pub fn model_timeout_secs(mut self, secs: u64) -> Self {
        self.config.model_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn vision_max_pages(mut self, n: usize) -> Self {
        self.config.vision_max_pages = n.max(1);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.enrichment_char_cap == 0 {
            return Err(PipelineError::InvalidConfig(
                "Enrichment character cap must be ≥ 1".into(),
            ));
        }
        for (name, secs) in [
            ("download", c.download_timeout_secs),
            ("extraction", c.extraction_timeout_secs),
            ("model", c.model_timeout_secs),
        ] {
            if secs == 0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} timeout must be ≥ 1s"
                )));
            }
        }
        if c.max_tokens == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.enrichment_char_cap, 8000);
        assert_eq!(c.download_timeout_secs, 120);
        assert_eq!(c.model_timeout_secs, 60);
        assert_eq!(c.concurrency, 4);
        assert!(c.provider.is_none());
    }

    #[test]
    fn builder_clamps() {
        let c = PipelineConfig::builder()
            .temperature(5.0)
            .concurrency(0)
            .vision_max_pages(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.vision_max_pages, 1);
    }

    #[test]
    fn zero_cap_rejected() {
        let err = PipelineConfig::builder()
            .enrichment_char_cap(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = PipelineConfig::builder()
            .model_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("model timeout"));
    }
}
