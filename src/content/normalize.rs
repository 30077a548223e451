//! Raw CMS document -> view model mapping
//!
//! These functions never fail. Absent or oddly-typed fields degrade to
//! empty strings, `None` or empty sequences.

use serde_json::Value;

use super::post::{ContentBlock, LinkTarget, PostDetail, PostSummary, Span, SpanKind, TextBlock};
use crate::cms::RawDocument;
use crate::helpers::{
    count_words, format_date, parse_timestamp, DateLocale, DISPLAY_DATE, DISPLAY_DATETIME,
};

/// Default reading speed for the reading time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Map a raw document to a list entry
pub fn normalize_summary(raw: &RawDocument, locale: DateLocale) -> PostSummary {
    PostSummary {
        uid: raw.uid.clone().unwrap_or_default(),
        first_publication_date: raw
            .first_publication_date
            .as_deref()
            .and_then(parse_timestamp)
            .map(|date| format_date(&date, DISPLAY_DATE, locale)),
        title: text_field(raw, "title"),
        subtitle: text_field(raw, "subtitle"),
        author: text_field(raw, "author"),
    }
}

/// Map a raw document to a detail page model
pub fn normalize_detail(raw: &RawDocument, locale: DateLocale) -> PostDetail {
    normalize_detail_with(raw, locale, WORDS_PER_MINUTE)
}

/// [`normalize_detail`] with a custom reading speed
pub fn normalize_detail_with(
    raw: &RawDocument,
    locale: DateLocale,
    words_per_minute: usize,
) -> PostDetail {
    let first_published_at = raw.first_publication_date.as_deref().and_then(parse_timestamp);
    let last_published_at = raw.last_publication_date.as_deref().and_then(parse_timestamp);

    let content: Vec<ContentBlock> = raw
        .field("content")
        .and_then(Value::as_array)
        .map(|sections| sections.iter().map(content_block).collect())
        .unwrap_or_default();

    PostDetail {
        id: raw.id.clone(),
        uid: raw.uid.clone().unwrap_or_default(),
        first_publication_date: first_published_at
            .map(|date| format_date(&date, DISPLAY_DATE, locale)),
        last_publication_date: last_published_at
            .map(|date| format_date(&date, DISPLAY_DATETIME, locale)),
        title: text_field(raw, "title"),
        subtitle: text_field(raw, "subtitle"),
        author: text_field(raw, "author"),
        banner_url: raw
            .field("banner")
            .and_then(|banner| banner.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        reading_time: reading_time(&content, words_per_minute),
        content,
        first_published_at,
        last_published_at,
    }
}

/// Minutes needed to read every heading and body block, rounded up
pub fn reading_time(content: &[ContentBlock], words_per_minute: usize) -> usize {
    let words: usize = content
        .iter()
        .map(|block| {
            count_words(&block.heading)
                + block
                    .body
                    .iter()
                    .map(|text| count_words(&text.text))
                    .sum::<usize>()
        })
        .sum();

    words.div_ceil(words_per_minute.max(1))
}

fn text_field(raw: &RawDocument, name: &str) -> String {
    raw.field(name).map(plain_text).unwrap_or_default()
}

/// Plain text of a key-text string or a rich-text block array
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn content_block(section: &Value) -> ContentBlock {
    ContentBlock {
        heading: section.get("heading").map(plain_text).unwrap_or_default(),
        body: section
            .get("body")
            .and_then(Value::as_array)
            .map(|blocks| blocks.iter().map(text_block).collect())
            .unwrap_or_default(),
    }
}

fn text_block(block: &Value) -> TextBlock {
    TextBlock {
        text: block
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        spans: block
            .get("spans")
            .and_then(Value::as_array)
            .map(|spans| spans.iter().filter_map(span).collect())
            .unwrap_or_default(),
        block_type: block
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("paragraph")
            .to_string(),
    }
}

fn span(value: &Value) -> Option<Span> {
    let start = value.get("start").and_then(Value::as_u64)? as usize;
    let end = value.get("end").and_then(Value::as_u64)? as usize;
    let name = value.get("type").and_then(Value::as_str).unwrap_or_default();

    let kind = match name {
        "strong" => SpanKind::Strong,
        "em" => SpanKind::Em,
        "hyperlink" => match value.get("data").and_then(link_target) {
            Some(target) => SpanKind::Hyperlink { target },
            None => SpanKind::Other {
                name: name.to_string(),
            },
        },
        other => SpanKind::Other {
            name: other.to_string(),
        },
    };

    Some(Span { start, end, kind })
}

fn link_target(data: &Value) -> Option<LinkTarget> {
    let str_field = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);

    match data.get("link_type").and_then(Value::as_str)? {
        "Web" => Some(LinkTarget::Web {
            url: str_field("url")?,
            new_tab: data.get("target").and_then(Value::as_str) == Some("_blank"),
        }),
        "Document" => Some(LinkTarget::Document {
            doc_type: str_field("type").unwrap_or_default(),
            uid: str_field("uid"),
        }),
        "Media" => Some(LinkTarget::Media {
            url: str_field("url")?,
        }),
        _ => None,
    }
}
