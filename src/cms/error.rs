//! CMS error kinds

use thiserror::Error;

/// Failures surfaced by the CMS client adapter
#[derive(Error, Debug)]
pub enum CmsError {
    /// Network, authentication, HTTP status or decoding failure
    #[error("CMS request failed: {0}")]
    FetchFailed(String),

    #[error("Document not found: {doc_type}/{uid}")]
    NotFound { doc_type: String, uid: String },

    /// A pagination cursor that does not point at the configured API
    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),
}

impl CmsError {
    pub fn not_found(doc_type: &str, uid: &str) -> Self {
        CmsError::NotFound {
            doc_type: doc_type.to_string(),
            uid: uid.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}

impl From<reqwest::Error> for CmsError {
    fn from(err: reqwest::Error) -> Self {
        CmsError::FetchFailed(err.to_string())
    }
}
