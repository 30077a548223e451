//! Post view models

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A post as shown in the list page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// Stable identifier, also the detail route segment
    pub uid: String,

    /// Display-formatted first publication date
    pub first_publication_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post as shown in the detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    /// CMS document id, used for prev/next lookups
    pub id: String,
    pub uid: String,

    /// Display-formatted first publication date
    pub first_publication_date: Option<String>,

    /// Display-formatted last publication date, with time of day
    pub last_publication_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,

    /// Ordered content sections
    pub content: Vec<ContentBlock>,

    /// Estimated reading time in minutes
    pub reading_time: usize,

    #[serde(skip)]
    pub(crate) first_published_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub(crate) last_published_at: Option<DateTime<Utc>>,
}

impl PostDetail {
    /// Whether the post changed after it was first published
    ///
    /// False when the timestamps are equal or the last publication date is absent.
    pub fn is_edited(&self) -> bool {
        match self.last_published_at {
            Some(last) => self.first_published_at != Some(last),
            None => false,
        }
    }
}

/// A section of a post: a heading followed by rich text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<TextBlock>,
}

/// One rich text block (paragraph, list item, heading...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextBlock {
    pub text: String,
    pub spans: Vec<Span>,
    #[serde(rename = "type")]
    pub block_type: String,
}

/// Inline formatting over a range of a [`TextBlock`]'s text
///
/// Offsets are UTF-16 code unit positions, as delivered by the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { target: LinkTarget },
    /// Any other span type; rendered as plain text
    Other { name: String },
}

/// Destination of a hyperlink span
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "link_type")]
pub enum LinkTarget {
    Web { url: String, new_tab: bool },
    Document { doc_type: String, uid: Option<String> },
    Media { url: String },
}

/// A neighbouring post in the detail page navigation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    pub uid: String,
    pub title: String,
}

/// Previous (older) and next (newer) posts around a detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostNavigation {
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
}
