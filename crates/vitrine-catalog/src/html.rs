//! HTML-to-text conversion for catalog fields.

use scraper::{ElementRef, Html};
use vitrine_core::text::collapse_whitespace;

/// Parse `input` as an HTML fragment and return its text.
///
/// Entities are decoded by the parser, and a bare `<` that opens no tag is
/// kept as text. Block-level elements become line breaks so sentence
/// splitting still sees paragraph boundaries; collapsing keeps those only
/// when `keep_lines`.
pub(crate) fn strip_html(input: &str, keep_lines: bool) -> String {
    let fragment = Html::parse_fragment(input);
    let mut text = String::with_capacity(input.len());
    push_text(fragment.root_element(), &mut text);

    if keep_lines {
        text.lines()
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        collapse_whitespace(&text)
    }
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if matches!(name, "script" | "style" | "template") {
            continue;
        }
        let block = is_block(name);
        if block {
            out.push('\n');
        }
        push_text(child, out);
        if block {
            out.push('\n');
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "br" | "p"
            | "div"
            | "li"
            | "ul"
            | "ol"
            | "tr"
            | "table"
            | "section"
            | "blockquote"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}
