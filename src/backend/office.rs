//! [`OfficeDocumentReader`] for Office Open XML packages (docx, pptx, xlsx).
//!
//! The package is opened in memory with `zip`. Text comes from, in order of
//! preference: the Word body, the slides in numeric order, the workbook's
//! shared strings. Paragraph and cell boundaries become line breaks.
//! Legacy binary formats (`.doc`, `.xls`) and ODF are not read; they fail
//! as `Unsupported`.

use crate::capability::OfficeDocumentReader;
use crate::error::CapabilityError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Upper bound on the decompressed size of one package part.
const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

const WORD_BODY: &str = "word/document.xml";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// Text run, or a boundary that ends a line (paragraph, shared-string item).
static RE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:w:|a:)?t(?:\s[^>]*)?>(.*?)</(?:w:|a:)?t>|</(?:w:|a:)?p>|</si>|<w:br\s*/>|<w:tab\s*/>")
        .unwrap()
});

static RE_NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").unwrap());

static RE_SLIDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Reads Office Open XML packages. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipOfficeReader;

#[async_trait]
impl OfficeDocumentReader for ZipOfficeReader {
    async fn extract_raw_text(&self, bytes: &[u8]) -> Result<String, CapabilityError> {
        let owned = bytes.to_vec();
        tokio::task::spawn_blocking(move || read_package(&owned))
            .await
            .map_err(|e| CapabilityError::Failed(format!("Office reader task panicked: {}", e)))?
    }
}

fn read_package(bytes: &[u8]) -> Result<String, CapabilityError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CapabilityError::Unsupported(format!("not an Office Open XML package: {e}")))?;

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    if names.iter().any(|n| n == WORD_BODY) {
        debug!("Reading Word document body");
        return Ok(xml_to_text(&read_part(&mut archive, WORD_BODY)?));
    }

    let mut slides: Vec<(u32, &String)> = names
        .iter()
        .filter_map(|n| {
            let caps = RE_SLIDE.captures(n)?;
            Some((caps[1].parse().ok()?, n))
        })
        .collect();
    if !slides.is_empty() {
        slides.sort_by_key(|(num, _)| *num);
        debug!("Reading {} slides", slides.len());
        let mut parts = Vec::with_capacity(slides.len());
        for (_, name) in slides {
            let text = xml_to_text(&read_part(&mut archive, name)?);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        return Ok(parts.join("\n\n"));
    }

    if names.iter().any(|n| n == SHARED_STRINGS) {
        debug!("Reading workbook shared strings");
        return Ok(xml_to_text(&read_part(&mut archive, SHARED_STRINGS)?));
    }

    Err(CapabilityError::Unsupported(
        "ZIP package has no Word, PowerPoint or Excel content".into(),
    ))
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, CapabilityError> {
    let file = archive
        .by_name(name)
        .map_err(|e| CapabilityError::Failed(format!("{name}: {e}")))?;
    let mut xml = String::new();
    file.take(MAX_PART_BYTES)
        .read_to_string(&mut xml)
        .map_err(|e| CapabilityError::Failed(format!("{name}: {e}")))?;
    Ok(xml)
}

/// Flatten WordprocessingML / DrawingML / SpreadsheetML text runs.
pub fn xml_to_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    for caps in RE_TOKEN.captures_iter(xml) {
        match caps.get(1) {
            Some(run) => out.push_str(&decode_entities(run.as_str())),
            None if caps[0].starts_with("<w:tab") => out.push('\t'),
            None => out.push('\n'),
        }
    }
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the five predefined XML entities plus `&#NN;` / `&#xHH;`.
pub fn decode_entities(input: &str) -> String {
    let s = RE_NUMERIC_ENTITY.replace_all(input, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    // &amp; last so "&amp;lt;" decodes to "&lt;", not "<".
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
