//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left intact when a value is placed in a URL component
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Document type served by the detail route
pub const POST_TYPE: &str = "posts";

/// Route of a post detail page
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", encode_component(uid))
}

/// Resolve a CMS document to a site route
///
/// # Examples
/// ```ignore
/// link_resolver("posts", Some("hello")) // -> "/post/hello"
/// link_resolver("page", None)           // -> "/"
/// ```
pub fn link_resolver(doc_type: &str, uid: Option<&str>) -> String {
    match uid {
        Some(uid) if doc_type == POST_TYPE && !uid.is_empty() => post_path(uid),
        _ => "/".to_string(),
    }
}

/// Route of the static continuation fragment for the given batch number
pub fn fragment_path(batch: usize) -> String {
    format!("/posts/page/{}.html", batch)
}

/// Route of the live continuation endpoint for a cursor
pub fn live_fragment_path(cursor: &str) -> String {
    format!("/api/posts?cursor={}", encode_component(cursor))
}

/// Encode a value for use as a path segment or inside a query string
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Whether an href leaves the site
pub fn is_external(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
}
