//! Raw CMS response shapes
//!
//! Only the envelope is typed. Document `data` stays a JSON value so that
//! a partial or oddly-typed document never fails to decode; the normalizer
//! picks fields out of it leniently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document as returned by the search API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    pub data: Value,
}

impl RawDocument {
    /// Field of `data`, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|value| !value.is_null())
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub page: u32,
    pub results_per_page: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    pub results: Vec<RawDocument>,
}

/// API root document; only the refs matter here
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiInfo {
    pub refs: Vec<RefInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefInfo {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub label: String,
    #[serde(rename = "isMasterRef")]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}
