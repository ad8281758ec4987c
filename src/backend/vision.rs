//! [`DocumentUnderstanding`] through a vision-capable LLM.
//!
//! PDFs are rasterised with pdfium and each page is transcribed separately;
//! pages are joined with a blank line in page order. Image uploads are sent
//! as-is with the MIME type `infer` detects; bytes `infer` does not know are
//! tried as an image by the `image` crate and re-encoded as PNG. Anything else
//! is unsupported, which the extraction cascade treats like any other failed
//! attempt.
//!
//! A page that fails is skipped with a warning. The call fails only when
//! every page failed, reporting the first error.

use crate::capability::DocumentUnderstanding;
use crate::error::CapabilityError;
use crate::pipeline::classify::DocumentKind;
use crate::pipeline::{encode, render};
use crate::prompts::VISION_TRANSCRIPTION_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::llm::classify_llm_error;

/// Vision transcription settings; low temperature, generous output budget.
const VISION_TEMPERATURE: f32 = 0.1;
const VISION_MAX_TOKENS: usize = 4096;

/// OCR by asking a vision model to transcribe page images.
pub struct VisionDocumentUnderstanding {
    provider: Arc<dyn LLMProvider>,
    max_pages: usize,
    max_pixels: u32,
    concurrency: usize,
}

impl VisionDocumentUnderstanding {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        max_pages: usize,
        max_pixels: u32,
        concurrency: usize,
    ) -> Self {
        Self {
            provider,
            max_pages: max_pages.max(1),
            max_pixels,
            concurrency: concurrency.max(1),
        }
    }

    async fn transcribe(&self, page_num: usize, image: ImageData) -> Result<String, CapabilityError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(VISION_TRANSCRIPTION_PROMPT),
            ChatMessage::user_with_images("", vec![image]),
        ];
        let options = CompletionOptions {
            temperature: Some(VISION_TEMPERATURE),
            max_tokens: Some(VISION_MAX_TOKENS),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| classify_llm_error(&e.to_string()))?;

        debug!(
            "Page {}: {} input tokens, {} output tokens, {:?}",
            page_num,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(strip_fences(&response.content))
    }

    async fn transcribe_pdf(&self, bytes: &[u8]) -> Result<String, CapabilityError> {
        let rendered = render::render_pdf_pages(bytes.to_vec(), self.max_pages, self.max_pixels).await?;
        if rendered.is_empty() {
            return Err(CapabilityError::Failed("PDF has no pages".into()));
        }

        let encoded: Vec<(usize, ImageData)> = rendered
            .iter()
            .filter_map(|(idx, img)| match encode::encode_page(img) {
                Ok(data) => Some((*idx + 1, data)),
                Err(e) => {
                    warn!("Failed to encode page {}: {}", idx + 1, e);
                    None
                }
            })
            .collect();

        // `buffered` keeps page order while overlapping the calls.
        let results: Vec<(usize, Result<String, CapabilityError>)> =
            stream::iter(encoded.into_iter().map(|(page_num, data)| async move {
                (page_num, self.transcribe(page_num, data).await)
            }))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut pages = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (page_num, result) in results {
            match result {
                Ok(text) => pages.push(text),
                Err(e) => {
                    warn!("Page {}: transcription failed: {}", page_num, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if pages.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| CapabilityError::Failed("no page could be encoded".into())));
        }
        info!("Transcribed {} page(s)", pages.len());
        Ok(pages.join("\n\n"))
    }
}

#[async_trait]
impl DocumentUnderstanding for VisionDocumentUnderstanding {
    async fn extract(&self, bytes: &[u8], kind_hint: DocumentKind) -> Result<String, CapabilityError> {
        if kind_hint == DocumentKind::Pdf || bytes.starts_with(b"%PDF") {
            return self.transcribe_pdf(bytes).await;
        }

        match infer::get(bytes) {
            Some(t) if t.mime_type().starts_with("image/") => {
                let image = encode::encode_bytes(bytes, t.mime_type());
                self.transcribe(1, image).await
            }
            Some(t) => Err(CapabilityError::Unsupported(format!(
                "{} is not a PDF or image",
                t.mime_type()
            ))),
            None => {
                let img = image::load_from_memory(bytes).map_err(|_| {
                    CapabilityError::Unsupported("unrecognised binary content".into())
                })?;
                let image = encode::encode_page(&img)
                    .map_err(|e| CapabilityError::Failed(format!("Image encoding failed: {e}")))?;
                self.transcribe(1, image).await
            }
        }
    }
}

/// Drop a wrapping ``` fence pair if the model added one anyway.
fn strip_fences(text: &str) -> String {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t.to_string();
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```text\nJane Doe\nRN\n```"), "Jane Doe\nRN");
        assert_eq!(strip_fences("```\nhello\n```\n"), "hello");
        assert_eq!(strip_fences("  plain page  "), "plain page");
    }
}
