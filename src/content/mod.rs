//! Content module - post view models and their construction from CMS documents

mod navigation;
mod normalize;
mod post;
pub mod richtext;

pub use navigation::adjacent_posts;
pub use normalize::{
    normalize_detail, normalize_detail_with, normalize_summary, reading_time, WORDS_PER_MINUTE,
};
pub use post::{
    ContentBlock, LinkTarget, NavLink, PostDetail, PostNavigation, PostSummary, Span, SpanKind,
    TextBlock,
};
pub use richtext::{LinkRenderer, MarkupNode, RouteLinkRenderer};
