//! Generator module - renders the home page and post pages to static HTML

mod detail;

pub use detail::{DetailState, Resolved};

use anyhow::{Context as _, Result};
use futures::stream::{self, StreamExt};
use std::fs;
use std::path::PathBuf;

use tera::Context;

use crate::client::{ClientError, ContentClient};
use crate::content::richtext::{self, SpanData};
use crate::content::{PostDetail, PostSummary};
use crate::helpers::{
    count_words, date_xml_opt, full_url_for, html_escape, post_url, reading_time, url_for,
    DateFormatter,
};
use crate::pagination::PostList;
use crate::templates::{
    InitialProps, PostItem, PostPageData, SectionData, SiteData, TemplateRenderer, ASSETS,
};
use crate::Blog;

/// File name of the pre-rendered loading shell inside the post directory
pub const FALLBACK_FILE: &str = "fallback.html";

/// What a full generation produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub listed: usize,
    pub posts_written: usize,
    pub missing: Vec<String>,
}

/// Static site generator over a content client
pub struct Generator<C> {
    blog: Blog,
    client: C,
    renderer: TemplateRenderer,
    dates: DateFormatter,
}

impl<C: ContentClient> Generator<C> {
    /// Create a new generator
    pub fn new(blog: &Blog, client: C) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            client,
            renderer: TemplateRenderer::new()?,
            dates: DateFormatter::new(&blog.config)?,
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateSummary> {
        let api = &self.blog.config.api;

        fs::create_dir_all(&self.blog.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.blog.public_dir))?;
        self.write_assets()?;

        // Home page from the first page of posts
        let list = PostList::initialize(&self.client, &api.document_type, api.page_size).await?;
        let html = self.render_index(&list)?;
        self.write_file(self.blog.public_dir.join("index.html"), &html)?;

        // One page per known post
        let ids = self.client.list_all_ids_by_type(&api.document_type).await?;
        tracing::info!("Found {} posts to pre-render", ids.len());

        let mut summary = GenerateSummary {
            listed: list.items().len(),
            ..Default::default()
        };

        let mut fetches = stream::iter(ids)
            .map(|id| async move {
                let fetched = self.fetch_detail(&id).await;
                (id, fetched)
            })
            .buffer_unordered(self.blog.config.build.concurrency.max(1));

        while let Some((id, fetched)) = fetches.next().await {
            match Resolved::from_fetch(fetched)? {
                Resolved::Ready(detail) => {
                    let html = self.render_post(&detail)?;
                    self.write_post(&detail.id, &html)?;
                    summary.posts_written += 1;
                }
                Resolved::NotFound => {
                    tracing::warn!("Post {} disappeared before it could be fetched", id);
                    summary.missing.push(id);
                }
            }
        }

        // Shells for the states not known at build time
        let loading = self.render_state(&DetailState::Loading)?;
        self.write_file(self.post_dir().join(FALLBACK_FILE), &loading)?;
        let not_found = self.render_state(&DetailState::NotFound)?;
        self.write_file(self.blog.public_dir.join("404.html"), &not_found)?;

        Ok(summary)
    }

    /// Fetch and decode one post
    pub async fn fetch_detail(&self, id: &str) -> Result<PostDetail, ClientError> {
        let doc = self
            .client
            .get_by_unique_id(&self.blog.config.api.document_type, id)
            .await?;
        Ok(PostDetail::try_from(&doc)?)
    }

    /// Render the home page for a listing state
    pub fn render_index(&self, list: &PostList) -> Result<String> {
        let posts: Vec<PostItem> = list.items().iter().map(|p| self.post_item(p)).collect();
        let props = InitialProps {
            items: list.items(),
            cursor: list.cursor(),
            post_base: url_for(
                &self.blog.config,
                &format!("{}/", self.blog.config.post_dir.trim_matches('/')),
            ),
            locale: self.blog.config.locale.clone(),
            timezone: self.blog.config.timezone.clone(),
        };

        let mut context = self.create_base_context();
        context.insert("posts", &posts);
        context.insert("show_load_more", &list.button_visible());
        context.insert("initial_props", &props);
        context.insert(
            "canonical_url",
            &html_escape(&full_url_for(&self.blog.config, "/")),
        );

        self.renderer.render("index.html", &context)
    }

    /// Build a listing entry, formatting the date at this point
    pub fn post_item(&self, post: &PostSummary) -> PostItem {
        PostItem {
            id: html_escape(&post.id),
            url: html_escape(&post_url(&self.blog.config, &post.id)),
            title: html_escape(&post.title),
            subtitle: html_escape(&post.subtitle),
            author: html_escape(&post.author),
            date: html_escape(&self.dates.format_opt(post.published_at.as_ref())),
            datetime: date_xml_opt(post.published_at.as_ref()),
        }
    }

    /// Render a post detail page
    pub fn render_post(&self, detail: &PostDetail) -> Result<String> {
        let config = &self.blog.config;
        let resolve_link = |link: &SpanData| -> Option<String> {
            match (link.link_type.as_deref(), &link.uid, &link.doc_type) {
                (Some("Document"), Some(uid), Some(doc_type))
                    if *doc_type == config.api.document_type =>
                {
                    Some(post_url(config, uid))
                }
                _ => link.url.clone(),
            }
        };

        let sections = detail
            .sections
            .iter()
            .map(|s| SectionData {
                heading: html_escape(&s.heading),
                html: richtext::as_html(&s.body, &resolve_link),
            })
            .collect();

        let words = count_words(&detail.plain_text());
        let page = PostPageData {
            id: html_escape(&detail.id),
            title: html_escape(&detail.title),
            banner_url: html_escape(&detail.banner_url),
            author: html_escape(&detail.author),
            date: html_escape(&self.dates.format_opt(detail.published_at.as_ref())),
            datetime: date_xml_opt(detail.published_at.as_ref()),
            reading_minutes: reading_time(words, config.words_per_minute),
            sections,
        };

        let mut context = self.create_base_context();
        context.insert("post", &page);
        context.insert(
            "canonical_url",
            &html_escape(&full_url_for(config, &post_url(config, &detail.id))),
        );
        self.renderer.render("post.html", &context)
    }

    /// Render whichever page a detail state calls for
    pub fn render_state(&self, state: &DetailState) -> Result<String> {
        match state {
            DetailState::Loading => self
                .renderer
                .render("loading.html", &self.create_base_context()),
            DetailState::Ready(detail) => self.render_post(detail),
            DetailState::NotFound => self.renderer.render("404.html", &self.create_base_context()),
        }
    }

    /// Write a rendered post to `{post_dir}/{id}/index.html`
    pub fn write_post(&self, id: &str, html: &str) -> Result<PathBuf> {
        let path = self.post_file(id)?;
        self.write_file(path.clone(), html)?;
        Ok(path)
    }

    /// Output path of a post page; ids that are not a single path segment are rejected
    pub fn post_file(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            anyhow::bail!("Post id {:?} cannot be used as a path segment", id);
        }
        Ok(self.post_dir().join(id).join("index.html"))
    }

    pub fn post_dir(&self) -> PathBuf {
        self.blog
            .public_dir
            .join(self.blog.config.post_dir.trim_matches('/'))
    }

    fn create_base_context(&self) -> Context {
        let config = &self.blog.config;
        let site = SiteData {
            title: html_escape(&config.title),
            home_url: html_escape(&url_for(config, "/")),
            logo_url: html_escape(&url_for(config, &config.logo)),
            asset_root: html_escape(&url_for(config, "/")),
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context.insert("lang", &html_escape(&config.locale));
        context
    }

    fn write_assets(&self) -> Result<()> {
        for (name, content) in ASSETS {
            self.write_file(self.blog.public_dir.join(name), content)?;
        }
        Ok(())
    }

    fn write_file(&self, path: PathBuf, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Generated: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{detail_doc, raw_page, summary_doc, FakeClient};
    use crate::config::SiteConfig;

    fn blog(dir: &std::path::Path) -> Blog {
        Blog::with_config(dir, SiteConfig::default())
    }

    fn client() -> FakeClient {
        FakeClient::with_first_page(raw_page(
            1,
            Some("https://x/page2"),
            vec![summary_doc("first", "2021-03-25T19:25:28+0000")],
        ))
        .document(detail_doc("first"))
        .document(detail_doc("second"))
    }

    #[tokio::test]
    async fn test_generate_writes_site() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();

        let summary = generator.generate().await.unwrap();
        assert_eq!(summary.listed, 1);
        assert_eq!(summary.posts_written, 2);
        assert!(summary.missing.is_empty());

        let public = dir.path().join("public");
        assert!(public.join("index.html").exists());
        assert!(public.join("post/first/index.html").exists());
        assert!(public.join("post/second/index.html").exists());
        assert!(public.join("post").join(FALLBACK_FILE).exists());
        assert!(public.join("404.html").exists());
        assert!(public.join("load-more.js").exists());
        assert!(public.join("logo.svg").exists());
    }

    #[tokio::test]
    async fn test_index_lists_posts_with_button() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        let list = PostList::initialize(generator.client(), "posts", 1)
            .await
            .unwrap();

        let html = generator.render_index(&list).unwrap();
        assert!(html.contains("<title>Posts | SpaceTraveling</title>"));
        assert!(html.contains(r#"href="/post/first/""#));
        assert!(html.contains("Title first"));
        assert!(html.contains("Subtitle first"));
        assert!(html.contains("Joseph Oliveira"));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(r#""next_page_url":"https://x/page2""#));
        assert!(html.contains(r#""current_page_index":1"#));
        assert!(html.contains(r#"<link rel="canonical" href="http://localhost:4000/">"#));
        assert!(html.contains(r#"<time datetime="2021-03-25T19:25:28+00:00">"#));
    }

    #[tokio::test]
    async fn test_index_hides_button_without_next_page() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::with_first_page(raw_page(
            1,
            None,
            vec![summary_doc("only", "2021-03-25T19:25:28+0000")],
        ));
        let generator = Generator::new(&blog(dir.path()), client).unwrap();
        let list = PostList::initialize(generator.client(), "posts", 1)
            .await
            .unwrap();

        let html = generator.render_index(&list).unwrap();
        assert!(html.contains(r#"href="/post/only/""#));
        assert!(!html.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_post_renders_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        let detail = generator.fetch_detail("first").await.unwrap();

        let html = generator.render_post(&detail).unwrap();
        assert!(html.contains("<title>Title first | SpaceTraveling</title>"));
        assert!(html.contains(r#"src="https://images.prismic.io/banner.png""#));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("Danilo Vieira"));
        assert!(html.contains("1 min"));
        assert!(html.contains(
            r#"<link rel="canonical" href="http://localhost:4000/post/first/">"#
        ));
        assert!(html.contains(r#"<time datetime="2021-03-25T19:25:28+00:00">"#));

        let first = html.find("<h2>First heading</h2>").unwrap();
        let first_body = html.find("<p>First body</p>").unwrap();
        let second = html.find("<h2>Second heading</h2>").unwrap();
        let second_body = html.find("<p>Second body</p>").unwrap();
        assert!(first < first_body);
        assert!(first_body < second);
        assert!(second < second_body);
        assert_eq!(html.matches("<h2>").count(), 2);
    }

    #[tokio::test]
    async fn test_titles_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        let mut detail = generator.fetch_detail("first").await.unwrap();
        detail.title = "<script>alert(1)</script>".to_string();

        let html = generator.render_post(&detail).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_fetch_detail_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        let err = generator.fetch_detail("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_render_states() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        assert!(generator
            .render_state(&DetailState::Loading)
            .unwrap()
            .contains("Carregando..."));
        assert!(generator
            .render_state(&DetailState::NotFound)
            .unwrap()
            .contains("404"));
    }

    #[test]
    fn test_post_file_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        assert!(generator.post_file("..").is_err());
        assert!(generator.post_file("a/b").is_err());
        assert!(generator.post_file("").is_err());
        assert!(generator
            .post_file("ok-id")
            .unwrap()
            .ends_with("post/ok-id/index.html"));
    }

    #[test]
    fn test_write_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), client()).unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/post"), "not a directory").unwrap();

        let err = generator.write_post("first", "<html></html>").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to create dir"));
        assert!(message.contains("post"));
    }
}
