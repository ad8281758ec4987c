//! Deterministic HTML → plain text.
//!
//! Not a readability engine. The document is parsed with `scraper` (html5ever),
//! so attribute values and character references are handled by a real parser.
//! Rules:
//! 1. Skip `<script>`, `<style>`, `<noscript>`, `<template>` subtrees and comments
//! 2. Block-level elements and `<br>` start a new line; table cells are space separated
//! 3. Collapse runs of whitespace within lines; drop blank lines

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}\f\v]+").unwrap());

const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "title", "tr", "ul",
];

/// Convert an HTML document to readable text.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);
    walk(document.root_element(), &mut out);
    collapse_whitespace(&out)
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCKS.contains(&name);
                let cell = name == "td" || name == "th";
                if block {
                    out.push('\n');
                }
                walk(child_el, out);
                if block {
                    out.push('\n');
                } else if cell {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| RE_SPACES.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_keeps_blocks_on_lines() {
        let html = "<html><head><title>CV</title></head><body><h1>Jane  Doe</h1><p>Nurse<br>Boston</p></body></html>";
        assert_eq!(html_to_text(html), "CV\nJane Doe\nNurse\nBoston");
    }

    #[test]
    fn removes_script_style_and_comments() {
        let html = r#"<p>keep</p><script type="text/javascript">var x = "<p>drop</p>";</script>
<STYLE>p { color: red }</STYLE><!-- hidden --><p>also keep</p>"#;
        assert_eq!(html_to_text(html), "keep\nalso keep");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            html_to_text("<p>Fish &amp; Chips &lt;3 &#169; &#x2014; caf&eacute;</p>"),
            "Fish & Chips <3 © \u{2014} café"
        );
        assert_eq!(
            html_to_text("<p>Jos&eacute; &mdash; caf&eacute; &rsquo;s</p>"),
            "José \u{2014} café \u{2019}s"
        );
        assert_eq!(html_to_text("<p>&amp;lt;</p>"), "&lt;");
    }

    #[test]
    fn quoted_angle_bracket_in_attribute_does_not_leak() {
        let html = r#"<p><a title="a > b" href="/x">Resume</a></p>"#;
        assert_eq!(html_to_text(html), "Resume");
    }

    #[test]
    fn table_cells_are_separated() {
        let html = "<table><tr><td>Role</td><td>Nurse</td></tr><tr><td>City</td><td>Boston</td></tr></table>";
        assert_eq!(html_to_text(html), "Role Nurse\nCity Boston");
    }

    #[test]
    fn collapses_whitespace() {
        let html = "<div>\n\n   lots\t\tof    space   \n\n</div>";
        assert_eq!(html_to_text(html), "lots of space");
    }

    #[test]
    fn empty_document_is_empty_text() {
        assert_eq!(html_to_text("<html><body><script>x()</script></body></html>"), "");
    }
}
