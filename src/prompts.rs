//! Prompts sent to generative and vision models.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: changing the enrichment contract (e.g. the
//!    tag count) requires editing exactly one place.
//!
//! 2. **Testability**: unit tests can inspect rendered prompts directly
//!    without a live model.

use crate::pipeline::enrich::EnrichmentRequest;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Placeholder replaced by the extracted text in caller-supplied templates.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Summarize-and-tag instruction.
///
/// `{kind}`, `{name}` and `{text}` are substituted by [`enrichment_prompt`].
pub const ENRICHMENT_PROMPT: &str = r#"You are a document analyst for a case-management system. Read the document below and describe it.

Document type: {kind}
Document name: {name}

Respond with a single raw JSON object with exactly two keys:
- "summary": a string of 2-3 sentences describing what the document is and its key facts
- "tags": an array of 3 to 5 short lowercase strings (e.g. "resume", "reference-letter", "transcript")

Output ONLY the JSON object.
Do NOT wrap it in ```json or any other markdown code fences.
Do NOT add headings, commentary or explanations.

Document content:
{text}"#;

/// System prompt for transcribing a page image to plain text.
pub const VISION_TRANSCRIPTION_PROMPT: &str = r#"You are an expert document transcriber. Your task is to transcribe the text of a document page image.

Follow these rules precisely:

1. TEXT PRESERVATION
   - Preserve ALL text content completely and accurately
   - Maintain the reading order as a human would read the page
   - Keep form labels next to their values ("Name: Jane Doe")

2. STRUCTURE
   - Separate paragraphs with a blank line
   - Render tables as one row per line with cells separated by " | "

3. WHAT TO IGNORE
   - Decorative borders, logos and lines that carry no text

4. OUTPUT FORMAT
   - Output ONLY the transcribed text
   - Do NOT wrap in ``` fences
   - Do NOT add commentary or explanations
   - If the page contains no readable text, output nothing"#;

static RE_PROMPT_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(kind|name|text)\}").unwrap());

/// Render the summarize-and-tag prompt for a request.
///
/// Fields are filled in one pass over the template, so placeholder-like text
/// inside the name or the document is never expanded.
pub fn enrichment_prompt(request: &EnrichmentRequest) -> String {
    RE_PROMPT_FIELD
        .replace_all(ENRICHMENT_PROMPT, |caps: &Captures<'_>| match &caps[1] {
            "kind" => request.document_kind.label(),
            "name" => request.document_name.as_deref().unwrap_or("(unnamed)"),
            _ => request.text.as_str(),
        })
        .into_owned()
}

/// Substitute `text` into a caller-supplied instruction template.
///
/// Every `{text}` occurrence is replaced. A template without the placeholder
/// gets the text appended after a blank line.
pub fn apply_instruction_template(template: &str, text: &str) -> String {
    if template.contains(TEXT_PLACEHOLDER) {
        template.replace(TEXT_PLACEHOLDER, text)
    } else {
        format!("{}\n\n{}", template.trim_end(), text)
    }
}
