//! Incremental list pagination
//!
//! The CMS hands back an opaque `next_page` URL with every result page.
//! [`PageCursor`] tracks whether there is one left to follow and
//! [`Accumulator`] owns the growing list of posts. The cursor is never
//! inspected, only followed.

use serde::Serialize;

use crate::cms::{CmsError, ContentApi, SearchResponse};
use crate::content::{normalize_summary, PostSummary};
use crate::helpers::DateLocale;

/// Pagination state of a post list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "cursor")]
pub enum PageCursor {
    /// More posts are available at this cursor
    HasMore(String),
    Exhausted,
}

impl PageCursor {
    /// Initial state of a list whose first page held `batch_len` posts
    ///
    /// An empty first page means there is nothing to load more of, whatever
    /// cursor came with it.
    pub fn initial(batch_len: usize, next_page: Option<String>) -> Self {
        match Self::following(next_page) {
            PageCursor::HasMore(cursor) if batch_len > 0 => PageCursor::HasMore(cursor),
            _ => PageCursor::Exhausted,
        }
    }

    /// State after an advance, `HasMore` whenever the response carried a cursor
    pub fn following(next_page: Option<String>) -> Self {
        match next_page.filter(|cursor| !cursor.is_empty()) {
            Some(cursor) => PageCursor::HasMore(cursor),
            None => PageCursor::Exhausted,
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(self, PageCursor::HasMore(_))
    }

    pub fn cursor(&self) -> Option<&str> {
        match self {
            PageCursor::HasMore(cursor) => Some(cursor.as_str()),
            PageCursor::Exhausted => None,
        }
    }
}

/// Fetch the page behind `state`, returning its posts and the following state
///
/// On [`PageCursor::Exhausted`] this returns an empty batch and the same state
/// without touching the CMS.
pub async fn advance(
    api: &dyn ContentApi,
    state: &PageCursor,
    locale: DateLocale,
) -> Result<(Vec<PostSummary>, PageCursor), CmsError> {
    let cursor = match state {
        PageCursor::HasMore(cursor) => cursor,
        PageCursor::Exhausted => return Ok((Vec::new(), PageCursor::Exhausted)),
    };

    tracing::debug!("Following pagination cursor");
    let response = api.fetch_page(cursor).await?;
    let (posts, next_page) = normalize_page(response, locale);
    Ok((posts, PageCursor::following(next_page)))
}

/// Normalize every result of a page, handing back its cursor
pub fn normalize_page(
    response: SearchResponse,
    locale: DateLocale,
) -> (Vec<PostSummary>, Option<String>) {
    let posts = response
        .results
        .iter()
        .map(|raw| normalize_summary(raw, locale))
        .collect();
    (posts, response.next_page)
}

/// An append-only list of posts plus its pagination state
///
/// [`Accumulator::advance`] takes `&mut self`, so at most one fetch per list
/// can be in flight.
#[derive(Debug, Clone, Serialize)]
pub struct Accumulator {
    posts: Vec<PostSummary>,
    state: PageCursor,
    locale: DateLocale,
}

impl Accumulator {
    /// Start from the first page of a query
    pub fn from_first_page(response: SearchResponse, locale: DateLocale) -> Self {
        let (posts, next_page) = normalize_page(response, locale);
        Self::new(posts, next_page, locale)
    }

    /// Start from an already normalized batch
    pub fn new(posts: Vec<PostSummary>, next_page: Option<String>, locale: DateLocale) -> Self {
        let state = PageCursor::initial(posts.len(), next_page);
        Self {
            posts,
            state,
            locale,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn state(&self) -> &PageCursor {
        &self.state
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more()
    }

    /// Fetch the next batch and append it, returning the number of new posts
    ///
    /// On failure the list and the state are left untouched so the caller
    /// can retry.
    pub async fn advance(&mut self, api: &dyn ContentApi) -> Result<usize, CmsError> {
        let (batch, next) = advance(api, &self.state, self.locale).await?;
        let added = batch.len();
        self.posts.extend(batch);
        self.state = next;
        Ok(added)
    }

    /// Advance until the CMS runs out of pages, returning each batch in order
    ///
    /// An empty batch stops the walk even if it carried a cursor, so a CMS
    /// handing out cursors to empty pages cannot keep it going forever.
    pub async fn drain(&mut self, api: &dyn ContentApi) -> Result<Vec<Vec<PostSummary>>, CmsError> {
        let mut batches = Vec::new();
        while self.has_more() {
            let before = self.posts.len();
            if self.advance(api).await? == 0 {
                self.state = PageCursor::Exhausted;
                break;
            }
            batches.push(self.posts[before..].to_vec());
        }
        Ok(batches)
    }

    pub fn into_posts(self) -> Vec<PostSummary> {
        self.posts
    }
}
