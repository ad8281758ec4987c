//! [`GenerativeModel`] over an `edgequake-llm` provider, plus provider resolution.

use crate::capability::GenerativeModel;
use crate::config::PipelineConfig;
use crate::error::{CapabilityError, PipelineError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Single-turn chat completion against any `edgequake-llm` provider.
pub struct LlmGenerativeModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmGenerativeModel {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(temperature),
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl GenerativeModel for LlmGenerativeModel {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| classify_llm_error(&e.to_string()))?;
        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Map a provider error message onto [`CapabilityError`].
pub(crate) fn classify_llm_error(message: &str) -> CapabilityError {
    let lower = message.to_lowercase();
    if message.contains("SAFETY") || lower.contains("content_filter") || lower.contains("content filter") {
        CapabilityError::SafetyBlocked(message.to_string())
    } else if lower.contains("timed out") || lower.contains("timeout") {
        CapabilityError::Transport(message.to_string())
    } else {
        CapabilityError::Failed(message.to_string())
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PipelineError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PipelineError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`, `config.model`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    honoured only when both are set.
/// 4. **OpenAI key** (`OPENAI_API_KEY`) with the configured or default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, PipelineError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PipelineError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_messages_are_recognised() {
        assert!(classify_llm_error("finish_reason: SAFETY").is_safety_block());
        assert!(classify_llm_error("Azure content_filter triggered").is_safety_block());
        assert!(classify_llm_error("Blocked by Content Filter").is_safety_block());
        assert!(!classify_llm_error("rate limited (429)").is_safety_block());
    }

    #[test]
    fn other_messages_are_failures() {
        assert!(matches!(
            classify_llm_error("invalid api key"),
            CapabilityError::Failed(_)
        ));
        assert!(matches!(
            classify_llm_error("request timed out"),
            CapabilityError::Transport(_)
        ));
    }
}
