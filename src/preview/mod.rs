//! Editorial preview sessions
//!
//! A preview session is nothing more than a CMS ref kept in an HttpOnly
//! cookie. While it is present every CMS query is made with that ref, so
//! drafts are rendered instead of the published snapshot.

use axum::http::{header, HeaderMap};
use percent_encoding::percent_decode_str;

use crate::cms::{ContentApi, QueryOptions};
use crate::helpers::{encode_component, link_resolver};

/// Name of the cookie carrying the preview ref
pub const PREVIEW_COOKIE: &str = "spacetraveling_preview";

const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; Secure; SameSite=Lax";

/// An active preview session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSession {
    reference: String,
}

impl PreviewSession {
    pub fn new(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        (!reference.is_empty()).then(|| Self {
            reference: reference.to_string(),
        })
    }

    /// Read the session from the request's `Cookie` headers
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == PREVIEW_COOKIE)
            .and_then(|(_, value)| {
                let decoded = percent_decode_str(value).decode_utf8().ok()?;
                Self::new(&decoded)
            })
    }

    /// The CMS ref to query with
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// `Set-Cookie` value starting a preview session
pub fn enter_cookie(token: &str) -> String {
    format!(
        "{}={}; {}",
        PREVIEW_COOKIE,
        encode_component(token),
        COOKIE_ATTRIBUTES
    )
}

/// `Set-Cookie` value ending the preview session
pub fn exit_cookie() -> String {
    format!("{}=; Max-Age=0; {}", PREVIEW_COOKIE, COOKIE_ATTRIBUTES)
}

/// Route of the previewed document, `/` when it cannot be resolved
pub async fn resolve_document(
    api: &dyn ContentApi,
    document_id: Option<&str>,
    reference: &str,
) -> String {
    let Some(id) = document_id.filter(|id| !id.is_empty()) else {
        return "/".to_string();
    };

    match api.get_by_id(id, &QueryOptions::with_ref(Some(reference))).await {
        Ok(doc) => link_resolver(&doc.doc_type, doc.uid.as_deref()),
        Err(e) => {
            tracing::warn!("Could not resolve preview document {}: {}", id, e);
            "/".to_string()
        }
    }
}
