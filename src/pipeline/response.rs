//! Defensive parsing of generative-model output.
//!
//! Models are asked for a bare JSON object `{"summary": …, "tags": […]}` and
//! routinely answer with something else: the object wrapped in ```` ```json ````
//! fences, a markdown heading in front of it, prose around it, or loose
//! `summary: "…"` lines that are not JSON at all.
//!
//! Parsing is three strictly ordered layers, each total over its input,
//! composed first-success-wins:
//!
//! 1. **Structured**: clean the text, then parse it (or its outermost
//!    `{…}` span) as JSON.
//! 2. **Regex scan**: independently scan the raw text for a quoted
//!    `summary` value and a bracketed `tags` list.
//! 3. **Sentinel**: [`SUMMARY_FAILED`] and no tags.
//!
//! Nothing here can fail; a contract violation is reported in the result.

use crate::output::{EnrichmentResult, EnrichmentStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Summary used when neither JSON nor regex yields one.
pub const SUMMARY_FAILED: &str = "Failed to generate summary";

// ── Cleaning rules ───────────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*").unwrap());

static RE_HEADER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t].*$").unwrap());

/// Strip code fences, stray backticks and markdown header lines; trim.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Remove fence markers with their language tag (```` ```json ````)
/// 3. Remove any remaining backticks
/// 4. Remove markdown header lines (`# …` to `###### …`)
/// 5. Trim
pub fn clean_response(raw: &str) -> String {
    let s = raw.replace("\r\n", "\n");
    let s = RE_FENCE.replace_all(&s, "");
    let s = s.replace('`', "");
    let s = RE_HEADER_LINE.replace_all(&s, "");
    s.trim().to_string()
}

// ── Layer 1: structured JSON ─────────────────────────────────────────────────

/// Parse cleaned text as the `{summary, tags}` object.
///
/// Accepts the whole text or, failing that, the span from the first `{` to
/// the last `}`. Requires a non-empty string `summary`; `tags` may be an
/// array (non-string scalars are stringified) or a comma-separated string,
/// and defaults to empty when absent.
pub fn parse_structured(cleaned: &str) -> Option<(String, Vec<String>)> {
    let value = serde_json::from_str::<Value>(cleaned)
        .ok()
        .filter(Value::is_object)
        .or_else(|| {
            let start = cleaned.find('{')?;
            let end = cleaned.rfind('}')?;
            (start < end)
                .then(|| serde_json::from_str::<Value>(&cleaned[start..=end]).ok())
                .flatten()
        })?;

    let obj = value.as_object()?;
    let summary = obj.get("summary")?.as_str()?.trim().to_string();
    if summary.is_empty() {
        return None;
    }

    let tags = match obj.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(s)) => split_tag_list(s),
        _ => Vec::new(),
    };

    Some((summary, tags))
}

// ── Layer 2: regex scans ─────────────────────────────────────────────────────

static RE_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)["']?summary["']?\s*[:=]\s*"([^"]*)""#).unwrap());

static RE_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)["']?tags["']?\s*[:=]\s*\[([^\]]*)\]"#).unwrap());

/// Quoted `summary` value, up to the next double quote.
pub fn scan_summary(raw: &str) -> Option<String> {
    RE_SUMMARY
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Bracketed `tags` list, split on commas.
pub fn scan_tags(raw: &str) -> Option<Vec<String>> {
    RE_TAGS.captures(raw).map(|caps| split_tag_list(&caps[1]))
}

fn split_tag_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|t| {
            t.trim()
                .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c.is_whitespace())
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

// ── Composition ──────────────────────────────────────────────────────────────

/// Parse a model response into an [`EnrichmentResult`]. Never fails.
pub fn parse_enrichment(raw: &str) -> EnrichmentResult {
    let cleaned = clean_response(raw);
    if let Some((summary, tags)) = parse_structured(&cleaned) {
        return EnrichmentResult {
            summary,
            tags,
            status: EnrichmentStatus::Generated,
            contract_violation: false,
        };
    }

    let summary = scan_summary(raw);
    let tags = scan_tags(raw);
    let status = if summary.is_some() || tags.is_some() {
        EnrichmentStatus::Recovered
    } else {
        EnrichmentStatus::Defaulted
    };
    warn!(
        "Model response violated the JSON contract ({} chars); {}",
        raw.len(),
        if status == EnrichmentStatus::Recovered {
            "recovered fields by regex"
        } else {
            "falling back to sentinel values"
        }
    );

    EnrichmentResult {
        summary: summary.unwrap_or_else(|| SUMMARY_FAILED.to_string()),
        tags: tags.unwrap_or_default(),
        status,
        contract_violation: true,
    }
}
