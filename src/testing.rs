//! In-memory CMS used by unit tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use crate::cms::{CmsError, ContentApi, Predicate, QueryOptions, RawDocument, SearchResponse};

const DEFAULT_PAGE_SIZE: usize = 20;

/// Build a post document
pub fn post_doc(id: &str, uid: &str, title: &str, published: &str) -> RawDocument {
    post_doc_with(id, uid, title, published, json!({}))
}

/// Build a post document with extra `data` fields merged in
pub fn post_doc_with(
    id: &str,
    uid: &str,
    title: &str,
    published: &str,
    extra: Value,
) -> RawDocument {
    let mut data = json!({
        "title": title,
        "subtitle": format!("{} subtitle", title),
        "author": "Autor",
        "banner": { "url": format!("https://images.example/{}.png", uid) },
        "content": [
            {
                "heading": format!("{} heading", title),
                "body": [{ "type": "paragraph", "text": format!("{} body text", title), "spans": [] }]
            }
        ]
    });
    if let (Some(data), Value::Object(extra)) = (data.as_object_mut(), extra) {
        data.extend(extra);
    }

    RawDocument {
        id: id.to_string(),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: Some(published.to_string()),
        last_publication_date: Some(published.to_string()),
        data,
    }
}

/// A CMS holding published documents, per-ref drafts and canned cursor pages
#[derive(Default)]
pub struct MemoryCms {
    published: Mutex<Vec<RawDocument>>,
    drafts: Vec<(String, RawDocument)>,
    pages: Mutex<HashMap<String, SearchResponse>>,
    next_query: AtomicUsize,
    failing: AtomicBool,
    requests: AtomicUsize,
}

impl MemoryCms {
    pub fn new(published: Vec<RawDocument>) -> Self {
        Self {
            published: Mutex::new(published),
            ..Default::default()
        }
    }

    /// Add a document only visible when querying with `reference`
    pub fn with_draft(mut self, reference: &str, doc: RawDocument) -> Self {
        self.drafts.push((reference.to_string(), doc));
        self
    }

    /// Register the response for an explicit cursor
    pub fn with_page(self, cursor: &str, response: SearchResponse) -> Self {
        self.lock_pages().insert(cursor.to_string(), response);
        self
    }

    /// Publish a document after construction
    pub fn publish(&self, doc: RawDocument) {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(doc);
    }

    /// Make every following request fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    /// Number of requests served so far
    pub fn requests(&self) -> usize {
        self.requests.load(AtomicOrdering::SeqCst)
    }

    fn lock_pages(&self) -> std::sync::MutexGuard<'_, HashMap<String, SearchResponse>> {
        self.pages.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_request(&self) -> Result<(), CmsError> {
        self.requests.fetch_add(1, AtomicOrdering::SeqCst);
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(CmsError::FetchFailed("connection refused".to_string()));
        }
        Ok(())
    }

    fn visible(&self, reference: Option<&str>) -> Vec<RawDocument> {
        let mut docs = self
            .published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(reference) = reference {
            for (draft_ref, draft) in &self.drafts {
                if draft_ref != reference {
                    continue;
                }
                match docs.iter_mut().find(|d| d.id == draft.id) {
                    Some(existing) => *existing = draft.clone(),
                    None => docs.push(draft.clone()),
                }
            }
        }
        docs
    }
}

fn satisfies(doc: &RawDocument, predicate: &Predicate) -> bool {
    let Predicate::At { path, value } = predicate;
    match path.as_str() {
        "document.type" => &doc.doc_type == value,
        "document.id" => &doc.id == value,
        p if p.ends_with(".uid") => doc.uid.as_deref() == Some(value.as_str()),
        _ => true,
    }
}

#[async_trait]
impl ContentApi for MemoryCms {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse, CmsError> {
        self.begin_request()?;

        let mut docs: Vec<RawDocument> = self
            .visible(options.reference.as_deref())
            .into_iter()
            .filter(|doc| predicates.iter().all(|p| satisfies(doc, p)))
            .collect();

        if let Some(ordering) = options.orderings.first() {
            docs.sort_by(|a, b| a.first_publication_date.cmp(&b.first_publication_date));
            if ordering.descending {
                docs.reverse();
            }
        }

        if let Some(after) = options.after.as_deref() {
            if let Some(position) = docs.iter().position(|d| d.id == after) {
                docs.drain(..=position);
            }
        }

        let size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let query_id = self.next_query.fetch_add(1, AtomicOrdering::SeqCst);
        let chunks: Vec<Vec<RawDocument>> = docs.chunks(size).map(|c| c.to_vec()).collect();
        let cursor = |page: usize| {
            format!(
                "https://memory.test/api/v2/documents/search?query={}&page={}",
                query_id, page
            )
        };

        let total_pages = chunks.len().max(1);
        let mut first = SearchResponse {
            page: 1,
            results_per_page: size as u32,
            total_results_size: docs.len() as u32,
            total_pages: total_pages as u32,
            next_page: None,
            prev_page: None,
            results: Vec::new(),
        };

        {
            let mut pages = self.lock_pages();
            for (index, chunk) in chunks.into_iter().enumerate() {
                let page = index + 1;
                let response = SearchResponse {
                    page: page as u32,
                    next_page: (page < total_pages).then(|| cursor(page + 1)),
                    results: chunk,
                    ..first.clone()
                };
                if page == 1 {
                    first = response;
                } else {
                    pages.insert(cursor(page), response);
                }
            }
        }

        Ok(first)
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError> {
        self.begin_request()?;
        self.lock_pages()
            .get(cursor)
            .cloned()
            .ok_or_else(|| CmsError::InvalidCursor(cursor.to_string()))
    }
}
