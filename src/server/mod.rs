//! Blog server
//!
//! Serves the generated site and renders what cannot be pre-generated:
//! preview pages, live load-more batches, and detail pages for posts
//! published after the last generation (fallback pages).

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::{CmsError, ContentApi};
use crate::generator::Generator;
use crate::helpers::live_fragment_path;
use crate::pagination::{self, PageCursor};
use crate::preview::{self, PreviewSession};
use crate::Blog;

/// Progress of a fallback page that was not generated ahead of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Pending,
    /// The CMS had no such post at this instant
    NotFound(Instant),
}

/// Bounds on the fallback registry
#[derive(Debug, Clone, Copy)]
pub struct FallbackLimits {
    /// How long a "not found" answer is trusted before the CMS is asked again
    pub not_found_ttl: Duration,
    /// Maximum number of uids tracked at once
    pub capacity: usize,
}

impl Default for FallbackLimits {
    fn default() -> Self {
        Self {
            not_found_ttl: Duration::from_secs(60),
            capacity: 1024,
        }
    }
}

impl FallbackLimits {
    fn expired(&self, resolution: &Resolution) -> bool {
        matches!(resolution, Resolution::NotFound(at) if at.elapsed() >= self.not_found_ttl)
    }

    /// Free one slot, dropping expired entries first and then the oldest
    /// "not found". Pending entries are never evicted.
    fn make_room(&self, fallback: &mut HashMap<String, Resolution>) -> bool {
        fallback.retain(|_, resolution| !self.expired(resolution));
        if fallback.len() < self.capacity.max(1) {
            return true;
        }

        let oldest = fallback
            .iter()
            .filter_map(|(uid, resolution)| match resolution {
                Resolution::NotFound(at) => Some((*at, uid.clone())),
                Resolution::Pending => None,
            })
            .min();
        match oldest {
            Some((_, uid)) => {
                fallback.remove(&uid);
                true
            }
            None => false,
        }
    }
}

/// Server state
pub struct ServerState {
    generator: Generator,
    api: Arc<dyn ContentApi>,
    limits: FallbackLimits,
    fallback: RwLock<HashMap<String, Resolution>>,
}

impl ServerState {
    pub fn new(generator: Generator, api: Arc<dyn ContentApi>) -> Arc<Self> {
        Self::with_limits(generator, api, FallbackLimits::default())
    }

    pub fn with_limits(
        generator: Generator,
        api: Arc<dyn ContentApi>,
        limits: FallbackLimits,
    ) -> Arc<Self> {
        Arc::new(Self {
            generator,
            api,
            limits,
            fallback: RwLock::new(HashMap::new()),
        })
    }

    fn lock_fallback(&self) -> RwLockWriteGuard<'_, HashMap<String, Resolution>> {
        self.fallback.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the known resolution for `uid`, or mark it pending and return `None`
    ///
    /// A full registry of pending generations answers `Pending` without
    /// tracking `uid`, so the loading page retries later.
    fn claim(&self, uid: &str) -> Option<Resolution> {
        let mut fallback = self.lock_fallback();
        match fallback.get(uid) {
            Some(resolution) if self.limits.expired(resolution) => {}
            Some(resolution) => return Some(*resolution),
            None if fallback.len() >= self.limits.capacity.max(1) => {
                if !self.limits.make_room(&mut fallback) {
                    return Some(Resolution::Pending);
                }
            }
            None => {}
        }
        fallback.insert(uid.to_string(), Resolution::Pending);
        None
    }

    fn settle(&self, uid: &str, outcome: Result<bool>) {
        let mut fallback = self.lock_fallback();
        match outcome {
            Ok(true) => {
                tracing::info!("Generated fallback page for {}", uid);
                fallback.remove(uid);
            }
            Ok(false) => {
                tracing::debug!("No post with uid {}", uid);
                fallback.insert(uid.to_string(), Resolution::NotFound(Instant::now()));
            }
            Err(e) => {
                tracing::error!("Fallback generation for {} failed: {:#}", uid, e);
                fallback.remove(uid);
            }
        }
    }

    fn html(&self, status: StatusCode, rendered: Result<String>) -> Response {
        match rendered {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Render failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Render failed").into_response()
            }
        }
    }

    fn not_found(&self) -> Response {
        self.html(StatusCode::NOT_FOUND, self.generator.render_not_found())
    }

    fn loading(&self) -> Response {
        self.html(StatusCode::OK, self.generator.render_loading())
    }

    fn cms_failure(&self, error: CmsError) -> Response {
        match error {
            CmsError::NotFound { .. } => self.not_found(),
            CmsError::InvalidCursor(cursor) => {
                tracing::warn!("Rejected cursor {}", cursor);
                (StatusCode::BAD_REQUEST, "Invalid cursor").into_response()
            }
            CmsError::FetchFailed(reason) => {
                tracing::warn!("CMS request failed: {}", reason);
                self.html(StatusCode::BAD_GATEWAY, self.generator.render_error())
            }
        }
    }

    /// Render the list page straight from the CMS
    async fn live_index(&self, reference: Option<&str>) -> Response {
        match self.generator.first_page(self.api.as_ref(), reference).await {
            Ok(list) => {
                let next = list.state().cursor().map(live_fragment_path);
                self.html(
                    StatusCode::OK,
                    self.generator
                        .render_index(list.posts(), next.as_deref(), reference.is_some()),
                )
            }
            Err(e) => self.cms_failure(e),
        }
    }

    /// Render a detail page straight from the CMS
    async fn live_post(&self, uid: &str, reference: &str) -> Response {
        match self
            .generator
            .load_post(self.api.as_ref(), uid, Some(reference))
            .await
        {
            Ok((post, navigation)) => self.html(
                StatusCode::OK,
                self.generator.render_post(&post, &navigation, true),
            ),
            Err(e) => self.cms_failure(e),
        }
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/api/posts", get(posts_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let api: Arc<dyn ContentApi> = Arc::new(blog.client()?);
    let state = ServerState::new(Generator::new(blog)?, api);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if let Some(session) = PreviewSession::from_headers(&headers) {
        return state.live_index(Some(session.reference())).await;
    }

    let index = state.generator.public_dir().join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => state.live_index(None).await,
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(session) = PreviewSession::from_headers(&headers) {
        return state.live_post(&uid, session.reference()).await;
    }

    let Some(path) = state.generator.post_file(&uid) else {
        return state.not_found();
    };
    if let Ok(html) = tokio::fs::read_to_string(&path).await {
        return Html(html).into_response();
    }
    if !state.generator.config().fallback {
        return state.not_found();
    }

    match state.claim(&uid) {
        Some(Resolution::NotFound(_)) => state.not_found(),
        Some(Resolution::Pending) => state.loading(),
        None => {
            let background = Arc::clone(&state);
            tokio::spawn(async move {
                let outcome = background
                    .generator
                    .generate_post(background.api.as_ref(), &uid)
                    .await;
                background.settle(&uid, outcome);
            });
            state.loading()
        }
    }
}

#[derive(Debug, Deserialize)]
struct CursorQuery {
    cursor: Option<String>,
}

/// Next batch of the post list, as an HTML fragment
async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CursorQuery>,
) -> Response {
    let Some(cursor) = query.cursor.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing cursor").into_response();
    };

    let locale = state.generator.config().date_locale();
    match pagination::advance(state.api.as_ref(), &PageCursor::HasMore(cursor), locale).await {
        Ok((batch, next)) => {
            let next = next.cursor().map(live_fragment_path);
            state.html(
                StatusCode::OK,
                state.generator.render_fragment(&batch, next.as_deref()),
            )
        }
        Err(e) => state.cms_failure(e),
    }
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let Some(session) = query.token.as_deref().and_then(PreviewSession::new) else {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    };

    let location = preview::resolve_document(
        state.api.as_ref(),
        query.document_id.as_deref(),
        session.reference(),
    )
    .await;
    tracing::info!("Entering preview, redirecting to {}", location);

    (
        [(header::SET_COOKIE, preview::enter_cookie(session.reference()))],
        Redirect::temporary(&location),
    )
        .into_response()
}

async fn exit_preview_handler() -> Response {
    (
        [(header::SET_COOKIE, preview::exit_cookie())],
        Redirect::temporary("/"),
    )
        .into_response()
}

/// Serve generated files, with the not-found page for anything missing
async fn static_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let mut service =
        ServeDir::new(state.generator.public_dir()).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => state.not_found(),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
