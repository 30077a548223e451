//! Generator module - renders pages with the built-in Tera templates and
//! writes the static site
//!
//! The same renderer backs the development server, which renders preview
//! and fallback pages on demand.

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::cms::{CmsError, ContentApi, Predicate, QueryOptions, RawDocument};
use crate::config::SiteConfig;
use crate::content::richtext::render_sections;
use crate::content::{
    adjacent_posts, normalize_detail_with, LinkRenderer, PostDetail, PostNavigation, PostSummary,
    RouteLinkRenderer,
};
use crate::helpers::{fragment_path, post_path, DateLocale, POST_TYPE};
use crate::i18n::Labels;
use crate::pagination::{Accumulator, PageCursor};
use crate::templates::{PostEntry, SiteData, TemplateRenderer};
use crate::Blog;

/// Fields requested for list entries
const LIST_FIELDS: &[&str] = &["posts.title", "posts.subtitle", "posts.author"];

/// Page size used when walking every post for detail pages
const WALK_PAGE_SIZE: usize = 100;

/// Seconds before the loading placeholder asks the browser to retry
const LOADING_RETRY_SECONDS: u64 = 2;

/// What a full generation produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub listed: usize,
    pub fragments: usize,
    pub posts: usize,
}

/// Page renderer and static site writer
pub struct Generator {
    config: SiteConfig,
    public_dir: PathBuf,
    renderer: TemplateRenderer,
    labels: &'static Labels,
    links: Box<dyn LinkRenderer>,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        Ok(Self {
            config: blog.config.clone(),
            public_dir: blog.public_dir.clone(),
            renderer,
            labels: Labels::for_language(&blog.config.language),
            links: Box::new(RouteLinkRenderer),
        })
    }

    /// Replace the renderer used for hyperlinks inside post bodies
    pub fn with_link_renderer(mut self, links: Box<dyn LinkRenderer>) -> Self {
        self.links = links;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    fn locale(&self) -> DateLocale {
        self.config.date_locale()
    }

    /// Query options for the post list
    pub fn list_options(&self, reference: Option<&str>) -> QueryOptions {
        QueryOptions::with_ref(reference)
            .page_size(self.config.page_size.max(1))
            .fetch(LIST_FIELDS)
    }

    /// Fetch the first page of the post list
    pub async fn first_page(
        &self,
        api: &dyn ContentApi,
        reference: Option<&str>,
    ) -> Result<Accumulator, CmsError> {
        let response = api
            .query(
                &[Predicate::at("document.type", POST_TYPE)],
                &self.list_options(reference),
            )
            .await?;
        Ok(Accumulator::from_first_page(response, self.locale()))
    }

    /// Fetch a post and its neighbours
    pub async fn load_post(
        &self,
        api: &dyn ContentApi,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<(PostDetail, PostNavigation), CmsError> {
        let raw = api
            .get_by_uid(POST_TYPE, uid, &QueryOptions::with_ref(reference))
            .await?;
        let post = normalize_detail_with(&raw, self.locale(), self.config.words_per_minute);
        let navigation = adjacent_posts(api, &post.id, reference).await?;
        Ok((post, navigation))
    }

    /// Build the context shared by every page
    fn base_context(&self, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from(&self.config));
        context.insert("labels", self.labels);
        context.insert("preview", &preview);
        context
    }

    pub fn render_index(
        &self,
        posts: &[PostSummary],
        next_href: Option<&str>,
        preview: bool,
    ) -> Result<String> {
        let mut context = self.base_context(preview);
        context.insert("posts", &entries(posts));
        context.insert("next_href", &next_href);
        self.renderer.render("index.html", &context)
    }

    /// Render one load-more batch
    pub fn render_fragment(&self, posts: &[PostSummary], next_href: Option<&str>) -> Result<String> {
        let mut context = self.base_context(false);
        context.insert("posts", &entries(posts));
        context.insert("next_href", &next_href);
        self.renderer.render("fragment.html", &context)
    }

    pub fn render_post(
        &self,
        post: &PostDetail,
        navigation: &PostNavigation,
        preview: bool,
    ) -> Result<String> {
        let mut context = self.base_context(preview);
        context.insert("post", post);
        context.insert("edited", &post.is_edited());
        context.insert("sections", &render_sections(&post.content, self.links.as_ref()));
        context.insert("navigation", navigation);
        context.insert(
            "prev_href",
            &navigation.prev.as_ref().map(|link| post_path(&link.uid)),
        );
        context.insert(
            "next_href",
            &navigation.next.as_ref().map(|link| post_path(&link.uid)),
        );
        context.insert("comments", &self.config.comments);
        self.renderer.render("post.html", &context)
    }

    /// Placeholder served while a fallback page is being generated
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.base_context(false);
        context.insert("retry_seconds", &LOADING_RETRY_SECONDS);
        self.renderer.render("loading.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer
            .render("not_found.html", &self.base_context(false))
    }

    pub fn render_error(&self) -> Result<String> {
        self.renderer.render("error.html", &self.base_context(false))
    }

    /// Generate the entire site
    pub async fn generate(&self, api: &dyn ContentApi) -> Result<GenerateSummary> {
        fs::create_dir_all(&self.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;

        let mut summary = self.generate_list(api).await?;

        for raw in self.all_posts(api).await? {
            if self.generate_detail(api, &raw).await? {
                summary.posts += 1;
            }
        }

        self.write(&self.public_dir.join("404.html"), &self.render_not_found()?)?;

        Ok(summary)
    }

    /// Write the index page and one static fragment per continuation batch
    async fn generate_list(&self, api: &dyn ContentApi) -> Result<GenerateSummary> {
        let mut list = self.first_page(api, None).await?;
        let first_len = list.posts().len();

        let index_next = list.has_more().then(|| fragment_path(2));
        let html = self.render_index(list.posts(), index_next.as_deref(), false)?;
        self.write(&self.public_dir.join("index.html"), &html)?;

        let batches = list.drain(api).await?;
        for (i, batch) in batches.iter().enumerate() {
            let number = i + 2;
            let next = (i + 1 < batches.len()).then(|| fragment_path(number + 1));
            let html = self.render_fragment(batch, next.as_deref())?;
            self.write(&self.fragment_file(number), &html)?;
        }

        tracing::info!(
            "Listed {} posts ({} on the first page, {} fragments)",
            list.posts().len(),
            first_len,
            batches.len()
        );

        Ok(GenerateSummary {
            listed: list.posts().len(),
            fragments: batches.len(),
            posts: 0,
        })
    }

    /// Every published post, following cursors until the CMS runs out
    async fn all_posts(&self, api: &dyn ContentApi) -> Result<Vec<RawDocument>, CmsError> {
        let mut response = api
            .query(
                &[Predicate::at("document.type", POST_TYPE)],
                &QueryOptions::default().page_size(WALK_PAGE_SIZE),
            )
            .await?;

        let mut documents = Vec::new();
        loop {
            let empty = response.results.is_empty();
            let next = PageCursor::following(response.next_page.take());
            documents.append(&mut response.results);
            match next {
                PageCursor::HasMore(cursor) if !empty => {
                    response = api.fetch_page(&cursor).await?;
                }
                _ => break,
            }
        }
        Ok(documents)
    }

    async fn generate_detail(&self, api: &dyn ContentApi, raw: &RawDocument) -> Result<bool> {
        let post = normalize_detail_with(raw, self.locale(), self.config.words_per_minute);
        let Some(path) = self.post_file(&post.uid) else {
            tracing::warn!("Skipping document {} with unusable uid {:?}", post.id, post.uid);
            return Ok(false);
        };

        let navigation = adjacent_posts(api, &post.id, None).await?;
        self.write(&path, &self.render_post(&post, &navigation, false)?)?;
        Ok(true)
    }

    /// Generate the detail page of a single post
    ///
    /// Returns `Ok(false)` when the CMS has no post with this uid.
    pub async fn generate_post(&self, api: &dyn ContentApi, uid: &str) -> Result<bool> {
        let Some(path) = self.post_file(uid) else {
            return Ok(false);
        };

        let (post, navigation) = match self.load_post(api, uid, None).await {
            Ok(loaded) => loaded,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        self.write(&path, &self.render_post(&post, &navigation, false)?)?;
        Ok(true)
    }

    /// On-disk location of a post's detail page
    ///
    /// `None` for uids that cannot be a single path segment.
    pub fn post_file(&self, uid: &str) -> Option<PathBuf> {
        let usable = !uid.is_empty()
            && uid != "."
            && uid != ".."
            && !uid.contains(['/', '\\', '\0']);
        usable.then(|| self.public_dir.join("post").join(uid).join("index.html"))
    }

    fn fragment_file(&self, number: usize) -> PathBuf {
        self.public_dir
            .join("posts")
            .join("page")
            .join(format!("{}.html", number))
    }

    fn write(&self, path: &Path, html: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Generated: {:?}", path);
        Ok(())
    }
}

fn entries(posts: &[PostSummary]) -> Vec<PostEntry> {
    posts.iter().map(PostEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CmsConfig;
    use crate::content::{LinkTarget, MarkupNode};
    use crate::testing::{post_doc, post_doc_with, MemoryCms};
    use serde_json::json;
    use tempfile::TempDir;

    fn blog(dir: &TempDir) -> Blog {
        Blog::with_cms(dir.path(), CmsConfig::new("test", None)).unwrap()
    }

    fn five_posts() -> MemoryCms {
        MemoryCms::new(
            (1..=5)
                .map(|i| {
                    post_doc(
                        &i.to_string(),
                        &format!("post-{}", i),
                        &format!("Post {}", i),
                        &format!("2021-03-0{}T10:00:00+0000", i),
                    )
                })
                .collect(),
        )
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("{:?}: {}", path, e))
    }

    #[tokio::test]
    async fn test_generate_writes_list_fragments_and_posts() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        let generator = Generator::new(&blog).unwrap();

        let summary = generator.generate(&five_posts()).await.unwrap();
        assert_eq!(
            summary,
            GenerateSummary {
                listed: 5,
                fragments: 2,
                posts: 5
            }
        );

        let index = read(blog.public_dir.join("index.html"));
        assert!(index.contains("Post 1"));
        assert!(index.contains("Post 2"));
        assert!(!index.contains("Post 3"));
        assert!(index.contains("Carregar mais posts"));
        assert!(index.contains("data-next=\"&#x2F;posts&#x2F;page&#x2F;2.html\""));

        let second = read(blog.public_dir.join("posts/page/2.html"));
        assert!(second.contains("Post 3") && second.contains("Post 4"));
        assert!(second.contains("data-next=\"&#x2F;posts&#x2F;page&#x2F;3.html\""));

        let last = read(blog.public_dir.join("posts/page/3.html"));
        assert!(last.contains("Post 5"));
        assert!(!last.contains("data-next"));

        for i in 1..=5 {
            let page = read(blog.public_dir.join(format!("post/post-{}/index.html", i)));
            assert!(page.contains(&format!("Post {} body text", i)));
        }
        assert!(blog.public_dir.join("404.html").exists());
    }

    #[tokio::test]
    async fn test_single_page_list_has_no_load_more() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        let generator = Generator::new(&blog).unwrap();
        let cms = MemoryCms::new(vec![post_doc("1", "only", "Only", "2021-03-01T10:00:00+0000")]);

        let summary = generator.generate(&cms).await.unwrap();
        assert_eq!(summary.fragments, 0);

        let index = read(blog.public_dir.join("index.html"));
        assert!(index.contains("Only"));
        assert!(!index.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_generation() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir)).unwrap();
        let cms = five_posts();
        cms.set_failing(true);

        assert!(generator.generate(&cms).await.is_err());
    }

    #[tokio::test]
    async fn test_render_post_details() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir)).unwrap();

        let mut edited = post_doc_with(
            "2",
            "second",
            "Second",
            "2021-03-25T19:25:00+0000",
            json!({ "author": "Danilo Vieira" }),
        );
        edited.last_publication_date = Some("2021-03-26T10:00:00+0000".to_string());
        let cms = MemoryCms::new(vec![
            post_doc("1", "first", "First", "2021-03-01T10:00:00+0000"),
            edited,
        ]);

        let (post, navigation) = generator.load_post(&cms, "second", None).await.unwrap();
        let html = generator.render_post(&post, &navigation, false).unwrap();

        assert!(html.contains("<title>Second | spacetraveling</title>"));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("Danilo Vieira"));
        assert!(html.contains("editado em 26 mar 2021, às 10:00"));
        assert!(html.contains("Post anterior"));
        assert!(html.contains("&#x2F;post&#x2F;first"));
        assert!(!html.contains("Próximo post"));
        assert!(!html.contains("Sair do modo Preview"));
        assert!(!html.contains("utteranc.es"));
    }

    #[tokio::test]
    async fn test_unedited_post_has_no_marker() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir)).unwrap();
        let cms = MemoryCms::new(vec![post_doc("1", "first", "First", "2021-03-01T10:00:00+0000")]);

        let (post, navigation) = generator.load_post(&cms, "first", None).await.unwrap();
        let html = generator.render_post(&post, &navigation, true).unwrap();

        assert!(!html.contains("editado em"));
        assert!(html.contains("Sair do modo Preview"));
        assert!(html.contains(r#"href="/api/exit-preview""#));
    }

    struct PlainLinks;

    impl LinkRenderer for PlainLinks {
        fn render(&self, _target: &LinkTarget, label: &MarkupNode) -> MarkupNode {
            MarkupNode::raw(format!("<u>{}</u>", label))
        }
    }

    #[tokio::test]
    async fn test_custom_link_renderer() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir))
            .unwrap()
            .with_link_renderer(Box::new(PlainLinks));
        let linked = post_doc_with(
            "1",
            "linked",
            "Linked",
            "2021-03-01T10:00:00+0000",
            json!({
                "content": [{
                    "heading": "Links",
                    "body": [{
                        "type": "paragraph",
                        "text": "See the docs",
                        "spans": [{
                            "start": 8, "end": 12, "type": "hyperlink",
                            "data": { "link_type": "Web", "url": "https://example.com" }
                        }]
                    }]
                }]
            }),
        );
        let cms = MemoryCms::new(vec![linked]);

        let (post, navigation) = generator.load_post(&cms, "linked", None).await.unwrap();
        let html = generator.render_post(&post, &navigation, false).unwrap();

        assert!(html.contains("See the <u>docs</u>"));
        assert!(!html.contains("https://example.com"));
    }

    #[tokio::test]
    async fn test_comments_widget_when_configured() {
        let dir = TempDir::new().unwrap();
        let mut blog = blog(&dir);
        blog.config.comments.repo = "owner/comments".to_string();
        let generator = Generator::new(&blog).unwrap();
        let cms = MemoryCms::new(vec![post_doc("1", "first", "First", "2021-03-01T10:00:00+0000")]);

        let (post, navigation) = generator.load_post(&cms, "first", None).await.unwrap();
        let html = generator.render_post(&post, &navigation, false).unwrap();

        assert!(html.contains("https://utteranc.es/client.js"));
        assert!(html.contains("repo=\"owner&#x2F;comments\""));
        assert!(html.contains("issue-term=\"pathname\""));
    }

    #[tokio::test]
    async fn test_generate_post_for_unknown_uid() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir)).unwrap();
        let cms = five_posts();

        assert!(!generator.generate_post(&cms, "missing").await.unwrap());
        assert!(generator.generate_post(&cms, "post-3").await.unwrap());
        assert!(generator.post_file("post-3").unwrap().exists());
    }

    #[test]
    fn test_post_file_rejects_unsafe_uids() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir)).unwrap();

        assert!(generator.post_file("como-utilizar-hooks").is_some());
        assert!(generator.post_file("").is_none());
        assert!(generator.post_file("..").is_none());
        assert!(generator.post_file("a/b").is_none());
    }

    #[test]
    fn test_status_pages() {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(&blog(&dir)).unwrap();

        assert!(generator.render_loading().unwrap().contains("Carregando..."));
        assert!(generator
            .render_not_found()
            .unwrap()
            .contains("Post não encontrado"));
        assert!(generator.render_error().unwrap().contains("Algo deu errado"));
    }
}
