//! Previous/next post lookup

use super::post::{NavLink, PostNavigation};
use crate::cms::{CmsError, ContentApi, Ordering, Predicate, QueryOptions, RawDocument};
use crate::helpers::POST_TYPE;

/// Both directions order by this field so prev and next stay symmetric
const NAVIGATION_ORDER: &str = "document.first_publication_date";

/// Find the posts published right before and right after `current_id`
pub async fn adjacent_posts(
    api: &dyn ContentApi,
    current_id: &str,
    reference: Option<&str>,
) -> Result<PostNavigation, CmsError> {
    if current_id.is_empty() {
        return Ok(PostNavigation::default());
    }

    let predicates = [Predicate::at("document.type", POST_TYPE)];
    let base = QueryOptions::with_ref(reference)
        .page_size(1)
        .after(current_id)
        .fetch(&["posts.title"]);

    let prev_options = base.clone().order_by(Ordering::desc(NAVIGATION_ORDER));
    let next_options = base.order_by(Ordering::asc(NAVIGATION_ORDER));

    let (prev, next) = tokio::try_join!(
        api.query(&predicates, &prev_options),
        api.query(&predicates, &next_options),
    )?;

    Ok(PostNavigation {
        prev: prev.results.first().and_then(nav_link),
        next: next.results.first().and_then(nav_link),
    })
}

fn nav_link(doc: &RawDocument) -> Option<NavLink> {
    let uid = doc.uid.clone().filter(|uid| !uid.is_empty())?;
    let title = doc
        .field("title")
        .and_then(|title| title.as_str())
        .unwrap_or(uid.as_str())
        .to_string();
    Some(NavLink { uid, title })
}
