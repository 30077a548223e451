//! Rich text to HTML
//!
//! Hyperlinks are rendered through a [`LinkRenderer`] supplied by the caller,
//! so the route scheme stays outside of this module.

use std::fmt;

use super::post::{ContentBlock, LinkTarget, Span, SpanKind, TextBlock};
use crate::helpers::{html_escape, is_external, link_resolver, link_to};

/// A fragment of already-escaped HTML
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupNode(String);

impl MarkupNode {
    /// Wrap markup that is already safe to emit
    pub fn raw(html: impl Into<String>) -> Self {
        MarkupNode(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MarkupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders an embedded link around an already rendered label
pub trait LinkRenderer: Send + Sync {
    fn render(&self, target: &LinkTarget, label: &MarkupNode) -> MarkupNode;
}

/// Default link renderer: documents resolve to site routes, web and media
/// links point at their URL
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteLinkRenderer;

impl LinkRenderer for RouteLinkRenderer {
    fn render(&self, target: &LinkTarget, label: &MarkupNode) -> MarkupNode {
        let html = match target {
            LinkTarget::Web { url, new_tab } => {
                link_to(url, label.as_str(), *new_tab || is_external(url))
            }
            LinkTarget::Document { doc_type, uid } => {
                link_to(&link_resolver(doc_type, uid.as_deref()), label.as_str(), false)
            }
            LinkTarget::Media { url } => link_to(url, label.as_str(), true),
        };
        MarkupNode::raw(html)
    }
}

/// A content section ready for a template
#[derive(Debug, Clone, serde::Serialize)]
pub struct RenderedSection {
    pub heading: String,
    pub body_html: String,
}

/// Render every section of a post
pub fn render_sections(content: &[ContentBlock], links: &dyn LinkRenderer) -> Vec<RenderedSection> {
    content
        .iter()
        .map(|section| RenderedSection {
            heading: section.heading.clone(),
            body_html: render_body(&section.body, links).into_string(),
        })
        .collect()
}

/// Render a sequence of blocks, grouping consecutive list items into lists
pub fn render_body(blocks: &[TextBlock], links: &dyn LinkRenderer) -> MarkupNode {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block.block_type.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        let inner = render_text(block, links);
        let tag = match block.block_type.as_str() {
            "list-item" | "o-list-item" => "li",
            "heading1" => "h1",
            "heading2" => "h2",
            "heading3" => "h3",
            "heading4" => "h4",
            "heading5" => "h5",
            "heading6" => "h6",
            "preformatted" => "pre",
            _ => "p",
        };
        out.push_str(&format!("<{tag}>{}</{tag}>", inner));
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }

    MarkupNode::raw(out)
}

/// Render the inline content of one block
pub fn render_text(block: &TextBlock, links: &dyn LinkRenderer) -> MarkupNode {
    let chars: Vec<char> = block.text.chars().collect();

    // Span offsets count UTF-16 code units; map them to char indices.
    let mut unit_to_char = Vec::with_capacity(block.text.len() + 1);
    for (index, c) in chars.iter().enumerate() {
        for _ in 0..c.len_utf16() {
            unit_to_char.push(index);
        }
    }
    unit_to_char.push(chars.len());
    let to_char = |unit: usize| unit_to_char.get(unit).copied().unwrap_or(chars.len());

    let mut spans: Vec<CharSpan> = block
        .spans
        .iter()
        .map(|span: &Span| CharSpan {
            start: to_char(span.start),
            end: to_char(span.end),
            kind: &span.kind,
        })
        .filter(|span| span.start < span.end)
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    MarkupNode::raw(render_range(&chars, 0, chars.len(), &spans, links))
}

struct CharSpan<'a> {
    start: usize,
    end: usize,
    kind: &'a SpanKind,
}

fn render_range(
    chars: &[char],
    start: usize,
    end: usize,
    spans: &[CharSpan<'_>],
    links: &dyn LinkRenderer,
) -> String {
    let mut out = String::new();
    let mut pos = start;

    for (i, span) in spans.iter().enumerate() {
        // Overlapping spans that are not nested are dropped
        if span.start < pos || span.end > end {
            continue;
        }

        out.push_str(&escape_chars(&chars[pos..span.start]));

        let children: Vec<CharSpan<'_>> = spans[i + 1..]
            .iter()
            .filter(|child| child.start >= span.start && child.end <= span.end)
            .map(|child| CharSpan {
                start: child.start,
                end: child.end,
                kind: child.kind,
            })
            .collect();
        let inner = MarkupNode::raw(render_range(chars, span.start, span.end, &children, links));

        let wrapped = match span.kind {
            SpanKind::Strong => format!("<strong>{}</strong>", inner),
            SpanKind::Em => format!("<em>{}</em>", inner),
            SpanKind::Hyperlink { target } => links.render(target, &inner).into_string(),
            SpanKind::Other { .. } => inner.into_string(),
        };
        out.push_str(&wrapped);
        pos = span.end;
    }

    out.push_str(&escape_chars(&chars[pos..end]));
    out
}

fn escape_chars(chars: &[char]) -> String {
    html_escape(&chars.iter().collect::<String>())
}
