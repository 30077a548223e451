//! Prismic REST API v2 client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::predicate::{render_orderings, render_query};
use super::{ApiInfo, CmsError, ContentApi, Predicate, QueryOptions, SearchResponse};
use crate::config::CmsConfig;

const TIMEOUT_SECONDS: u64 = 30;

/// HTTP client for one Prismic repository
#[derive(Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    config: CmsConfig,
    endpoint: Url,
}

impl PrismicClient {
    /// Create a client for the configured repository
    pub fn new(config: CmsConfig) -> Result<Self, CmsError> {
        let endpoint = Url::parse(&config.api_endpoint).map_err(|e| {
            CmsError::FetchFailed(format!("invalid API endpoint {}: {}", config.api_endpoint, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            endpoint,
        })
    }

    /// Connection settings this client was built with
    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Ref of the published content snapshot
    pub async fn master_ref(&self) -> Result<String, CmsError> {
        let mut url = self.endpoint.clone();
        self.append_access_token(&mut url);

        let info: ApiInfo = self.get_json(url).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or_else(|| CmsError::FetchFailed("API has no master ref".to_string()))
    }

    fn search_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        let path = format!("{}/documents/search", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }

    fn append_access_token(&self, url: &mut Url) {
        let Some(token) = self.config.access_token.as_deref() else {
            return;
        };
        if url.query_pairs().any(|(key, _)| key == "access_token") {
            return;
        }
        url.query_pairs_mut().append_pair("access_token", token);
    }

    /// Parse a cursor and make sure it targets this repository's API
    fn cursor_url(&self, cursor: &str) -> Result<Url, CmsError> {
        let url = Url::parse(cursor).map_err(|_| CmsError::InvalidCursor(cursor.to_string()))?;

        let same_origin = url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default();
        let base_path = self.endpoint.path().trim_end_matches('/');
        let under_base = url
            .path()
            .strip_prefix(base_path)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if !same_origin || !under_base {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }

        Ok(url)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, CmsError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!("CMS GET {}", url.path());

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::FetchFailed(format!(
                "CMS responded with {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CmsError::FetchFailed(format!("invalid CMS response: {}", e)))
    }
}

#[async_trait]
impl ContentApi for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse, CmsError> {
        let reference = match options.reference.as_deref() {
            Some(reference) => reference.to_string(),
            None => self.master_ref().await?,
        };

        let mut url = self.search_url();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            if !predicates.is_empty() {
                pairs.append_pair("q", &render_query(predicates));
            }
            if let Some(size) = options.page_size {
                pairs.append_pair("pageSize", &size.to_string());
            }
            if !options.fetch.is_empty() {
                pairs.append_pair("fetch", &options.fetch.join(","));
            }
            if !options.orderings.is_empty() {
                pairs.append_pair("orderings", &render_orderings(&options.orderings));
            }
            if let Some(after) = options.after.as_deref() {
                pairs.append_pair("after", after);
            }
        }
        self.append_access_token(&mut url);

        self.get_json(url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError> {
        let mut url = self.cursor_url(cursor)?;
        self.append_access_token(&mut url);
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> PrismicClient {
        let mut config = CmsConfig::new("test", token.map(str::to_string));
        config.api_endpoint = format!("{}/api/v2", server.uri());
        PrismicClient::new(config).unwrap()
    }

    async fn mount_master_ref(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "refs": [{ "id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_query_uses_master_ref_when_not_previewing() {
        let server = MockServer::start().await;
        mount_master_ref(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("ref", "master-ref"))
            .and(query_param("q", r#"[[at(document.type,"posts")]]"#))
            .and(query_param("pageSize", "2"))
            .and(query_param("access_token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "next_page": "https://example.com/next",
                "results": [{ "id": "1", "uid": "a", "type": "posts", "data": {} }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let response = client
            .query(
                &[Predicate::at("document.type", "posts")],
                &QueryOptions::default().page_size(2),
            )
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.next_page.as_deref(), Some("https://example.com/next"));
    }

    #[tokio::test]
    async fn test_get_by_uid_threads_preview_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("ref", "draft-ref"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "id": "9", "uid": "draft-post", "type": "posts", "data": { "title": "Draft" } }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let doc = client
            .get_by_uid("posts", "draft-post", &QueryOptions::with_ref(Some("draft-ref")))
            .await
            .unwrap();
        assert_eq!(doc.uid.as_deref(), Some("draft-post"));
    }

    #[tokio::test]
    async fn test_get_by_uid_not_found() {
        let server = MockServer::start().await;
        mount_master_ref(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client
            .get_by_uid("posts", "missing", &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_failure_is_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client
            .query(&[], &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/documents/search"))
            .and(query_param("page", "2"))
            .and(query_param("access_token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 2,
                "next_page": null,
                "results": [{ "id": "2", "uid": "b", "type": "posts", "data": {} }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let cursor = format!("{}/api/v2/documents/search?ref=master-ref&page=2", server.uri());
        let response = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(response.results[0].uid.as_deref(), Some("b"));
        assert!(response.next_page.is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_foreign_cursor() {
        let server = MockServer::start().await;
        let client = client_for(&server, None);

        let err = client
            .fetch_page("https://attacker.example/api/v2/documents/search")
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::InvalidCursor(_)));

        let err = client.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, CmsError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_sibling_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
            .mount(&server)
            .await;
        let client = client_for(&server, None);

        let cursor = format!("{}/api/v2evil/documents/search?page=2", server.uri());
        let err = client.fetch_page(&cursor).await.unwrap_err();
        assert!(matches!(err, CmsError::InvalidCursor(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
