use std::fmt;

use scraper::{ElementRef, Html, Selector};

pub const NO_TITLE: &str = "No title found";

const TEXT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, div, span, li, code, pre";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Rendered between blank lines to mark a code block.
    Code(String),
}

/// Flattened text of a page: a title line and block text in document order.
///
/// Nested elements each contribute their own segment, so text inside a `div`
/// that also contains a `p` appears twice. Structure (tables, links, nesting)
/// is not preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub segments: Vec<Segment>,
}

impl Document {
    pub fn render(&self) -> String {
        let body = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.clone(),
                Segment::Code(text) => format!("\n{text}\n"),
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\n{}", self.title, body).trim().to_string()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Document;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn extract(&self, html: &str) -> Document {
        let doc = Html::parse_document(html);

        let title = Selector::parse("title")
            .ok()
            .and_then(|sel| doc.select(&sel).next().map(collapsed_text))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let segments = match Selector::parse(TEXT_SELECTOR) {
            Ok(sel) => doc
                .select(&sel)
                .map(|node| {
                    let text = collapsed_text(node);
                    match node.value().name() {
                        "code" | "pre" => Segment::Code(text),
                        _ => Segment::Text(text),
                    }
                })
                .collect(),
            Err(_) => Vec::new(),
        };

        Document { title, segments }
    }
}

/// Every text run trimmed, empty runs dropped, joined by single spaces.
fn collapsed_text(node: ElementRef<'_>) -> String {
    node.text()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
