//! CMS client adapter
//!
//! [`ContentApi`] is the seam between the site and the headless CMS. The
//! production implementation is [`PrismicClient`]; everything above this
//! module only sees normalized results and [`CmsError`].

mod client;
mod document;
mod error;
mod predicate;

pub use client::PrismicClient;
pub use document::{ApiInfo, RawDocument, RefInfo, SearchResponse};
pub use error::CmsError;
pub use predicate::{render_orderings, render_query, Ordering, Predicate, QueryOptions};

use async_trait::async_trait;

/// Read access to the CMS query API
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Run a predicate query
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse, CmsError>;

    /// Follow an opaque `next_page` cursor returned by a previous query
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError>;

    /// Fetch a single document by type and uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<RawDocument, CmsError> {
        let predicates = [
            Predicate::at("document.type", doc_type),
            Predicate::at(&format!("my.{}.uid", doc_type), uid),
        ];
        let options = QueryOptions {
            page_size: Some(1),
            ..options.clone()
        };
        let response = self.query(&predicates, &options).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::not_found(doc_type, uid))
    }

    /// Fetch a single document by id
    async fn get_by_id(&self, id: &str, options: &QueryOptions) -> Result<RawDocument, CmsError> {
        let options = QueryOptions {
            page_size: Some(1),
            ..options.clone()
        };
        let response = self
            .query(&[Predicate::at("document.id", id)], &options)
            .await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::not_found("document", id))
    }
}
