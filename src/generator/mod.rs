//! Generator module - writes the static site from a post snapshot

use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::html::{html_escape, HtmlRenderer, RenderContext};
use crate::content::{MarkdownRenderer, Node, Post, PostRepository};
use crate::Folio;

/// Static site generator
pub struct Generator {
    folio: Folio,
    markdown: MarkdownRenderer,
    html: HtmlRenderer,
    ctx: RenderContext,
}

impl Generator {
    /// Create a new generator
    pub fn new(folio: &Folio) -> Self {
        Self {
            folio: folio.clone(),
            markdown: folio.markdown_renderer(),
            html: HtmlRenderer::new(),
            ctx: folio.render_context(),
        }
    }

    /// Generate the entire site
    pub fn generate(&self, repo: &PostRepository) -> Result<()> {
        fs::create_dir_all(&self.folio.public_dir)?;

        // Copy images and videos that live next to the posts
        self.copy_content_assets()?;

        self.generate_index_page(repo)?;
        self.generate_post_pages(repo)?;
        self.generate_tag_pages(repo)?;
        self.generate_search_index(repo)?;

        Ok(())
    }

    /// Render a post body to an HTML fragment. Relative media sources are
    /// resolved against the post's directory in the content tree, which is
    /// where `copy_content_assets` puts them under the public root.
    pub fn render_post(&self, post: &Post) -> String {
        let mut doc = self.markdown.render(&post.content);
        let base = source_dir(post);
        doc.for_each_mut(|node| match node {
            Node::Image { src, alternate, .. } => {
                *src = self.media_url(base, src);
                if let Some(alternate) = alternate {
                    *alternate = self.media_url(base, alternate);
                }
            }
            Node::Video { src, .. } => *src = self.media_url(base, src),
            _ => {}
        });
        self.html.render(&doc, &self.ctx)
    }

    /// Site URL of a media reference found in a post under `base`
    fn media_url(&self, base: &str, src: &str) -> String {
        if !is_relative(src) {
            return src.to_string();
        }
        let src = src.strip_prefix("./").unwrap_or(src);
        self.url(&format!("{}{}", base, src))
    }

    /// Generate the home page listing every post
    fn generate_index_page(&self, repo: &PostRepository) -> Result<()> {
        let items: Vec<&Post> = repo.all().collect();
        let body = format!(
            r#"<h1 class="{text}">{title}</h1>{desc}{list}"#,
            text = self.ctx.text(),
            title = html_escape(&self.folio.config.title),
            desc = self.description(),
            list = self.post_list(&items),
        );
        self.write_page("", &self.layout(&self.folio.config.title, &body))?;
        tracing::info!("Generated index with {} posts", items.len());
        Ok(())
    }

    /// Generate one page per post
    fn generate_post_pages(&self, repo: &PostRepository) -> Result<()> {
        let posts: Vec<&Post> = repo.all().collect();

        for (i, post) in posts.iter().enumerate() {
            // Newer post first in the list, so "previous" is the older one
            let prev = posts.get(i + 1).copied();
            let next = if i > 0 { posts.get(i - 1).copied() } else { None };

            let tags: String = post
                .tags
                .iter()
                .map(|t| {
                    format!(
                        r#"<a href="{href}" class="tag {accent}">#{tag}</a>"#,
                        href = self.url(&format!("tags/{}/", slug::slugify(t))),
                        accent = self.ctx.accent_text(),
                        tag = html_escape(t),
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");

            let body = format!(
                concat!(
                    r#"<article class="post">"#,
                    r#"<header class="border-b {border}">"#,
                    r#"<h1 class="{text}">{title}</h1>"#,
                    r#"<p class="meta {muted}"><time datetime="{date}">{date}</time> {tags}</p>"#,
                    r#"</header>"#,
                    r#"<div class="post-body">{content}</div>"#,
                    r#"</article>{nav}"#
                ),
                border = self.ctx.border(),
                text = self.ctx.text(),
                title = html_escape(&post.title),
                muted = self.ctx.text_muted(),
                date = html_escape(&post.date),
                tags = tags,
                content = self.render_post(post),
                nav = self.post_nav(prev, next),
            );

            self.write_page(&post.path(), &self.layout(&post.title, &body))?;
            tracing::debug!("Generated post: {}", post.slug);
        }

        Ok(())
    }

    /// Generate one page per tag
    fn generate_tag_pages(&self, repo: &PostRepository) -> Result<()> {
        let mut count = 0;
        for tag in repo.all_tags() {
            let tag_slug = slug::slugify(&tag);
            if tag_slug.is_empty() {
                continue;
            }

            let posts = repo.get_by_tag(&tag);
            let body = format!(
                r#"<h1 class="{text}">#{tag}</h1>{list}"#,
                text = self.ctx.text(),
                tag = html_escape(&tag),
                list = self.post_list(&posts),
            );
            let title = format!("#{}", tag);
            self.write_page(&format!("tags/{}/", tag_slug), &self.layout(&title, &body))?;
            count += 1;
        }

        tracing::info!("Generated {} tag pages", count);
        Ok(())
    }

    /// Generate search index for client-side search
    fn generate_search_index(&self, repo: &PostRepository) -> Result<()> {
        let search_data: Vec<serde_json::Value> = repo
            .all()
            .map(|p| {
                serde_json::json!({
                    "slug": p.slug,
                    "title": p.title,
                    "url": self.url(&p.path()),
                    "date": p.date,
                    "summary": p.summary,
                    "tags": p.tags,
                })
            })
            .collect();

        let output_path = self.folio.public_dir.join("search.json");
        let json = serde_json::to_string_pretty(&search_data)?;
        fs::write(&output_path, json)?;
        tracing::info!("Generated search.json");

        Ok(())
    }

    /// Copy non-markdown files from the content directory
    fn copy_content_assets(&self) -> Result<()> {
        let content_dir = &self.folio.content_dir;
        if !content_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().is_some_and(|e| e == "md") {
                continue;
            }

            let relative = path.strip_prefix(content_dir)?;
            let dest = self.folio.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }

    /// Listing rows: display date, title, summary and first tag
    fn post_list(&self, posts: &[&Post]) -> String {
        let mut out = String::from(r#"<ul class="post-list">"#);
        for post in posts {
            let first_tag = post
                .tags
                .first()
                .map(|t| {
                    format!(
                        r#" <span class="tag {}">#{}</span>"#,
                        self.ctx.accent_text(),
                        html_escape(t)
                    )
                })
                .unwrap_or_default();
            let summary = if post.summary.is_empty() {
                String::new()
            } else {
                format!(
                    r#"<p class="summary {}">{}</p>"#,
                    self.ctx.text_muted(),
                    html_escape(&post.summary)
                )
            };
            out.push_str(&format!(
                concat!(
                    r#"<li class="border-b {border}">"#,
                    r#"<span class="date {muted}">{date}</span> "#,
                    r#"<a href="{href}" class="{text}">{title}</a>{tag}{summary}</li>"#
                ),
                border = self.ctx.border(),
                muted = self.ctx.text_muted(),
                date = html_escape(&post.display_date()),
                href = self.url(&post.path()),
                text = self.ctx.text(),
                title = html_escape(&post.title),
                tag = first_tag,
                summary = summary,
            ));
        }
        out.push_str("</ul>");
        out
    }

    fn post_nav(&self, prev: Option<&Post>, next: Option<&Post>) -> String {
        if prev.is_none() && next.is_none() {
            return String::new();
        }
        let link = |post: Option<&Post>, rel: &str| -> String {
            post.map(|p| {
                format!(
                    r#"<a href="{}" rel="{}" class="{}">{}</a>"#,
                    self.url(&p.path()),
                    rel,
                    self.ctx.accent_text(),
                    html_escape(&p.title)
                )
            })
            .unwrap_or_default()
        };
        format!(
            r#"<nav class="post-nav border-t {}">{}{}</nav>"#,
            self.ctx.border(),
            link(prev, "prev"),
            link(next, "next")
        )
    }

    fn description(&self) -> String {
        let desc = &self.folio.config.description;
        if desc.is_empty() {
            String::new()
        } else {
            format!(
                r#"<p class="{}">{}</p>"#,
                self.ctx.text_muted(),
                html_escape(desc)
            )
        }
    }

    /// Wrap a page body in the site shell
    fn layout(&self, title: &str, body: &str) -> String {
        let site_title = &self.folio.config.title;
        let page_title = if title == site_title {
            html_escape(site_title)
        } else {
            format!("{} | {}", html_escape(title), html_escape(site_title))
        };
        format!(
            concat!(
                "<!DOCTYPE html>\n",
                r#"<html lang="en" data-mode="{mode}" data-accent="{accent}">"#,
                "<head>",
                r#"<meta charset="utf-8">"#,
                r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
                r#"<meta name="author" content="{author}">"#,
                "<title>{page_title}</title>",
                "</head>",
                r#"<body class="{bg} {text}">"#,
                r#"<nav class="site-nav"><a href="{home}" class="{accent_text}">{site_title}</a></nav>"#,
                "<main>{body}</main>",
                "</body>",
                "</html>\n"
            ),
            mode = self.ctx.mode.name(),
            accent = self.ctx.accent.name(),
            author = html_escape(&self.folio.config.author),
            page_title = page_title,
            bg = self.ctx.bg(),
            text = self.ctx.text(),
            home = self.url(""),
            accent_text = self.ctx.accent_text(),
            site_title = html_escape(site_title),
            body = body,
        )
    }

    /// Site-relative URL under the configured root
    fn url(&self, path: &str) -> String {
        let root = self.folio.config.root.trim_end_matches('/');
        format!("{}/{}", root, path.trim_start_matches('/'))
    }

    fn write_page(&self, path: &str, html: &str) -> Result<()> {
        let output_path = self
            .folio
            .public_dir
            .join(path.trim_start_matches('/'))
            .join("index.html");
        write_file(&output_path, html)
    }
}

/// Directory part of the post's content path, with a trailing slash
fn source_dir(post: &Post) -> &str {
    match post.slug.rfind('/') {
        Some(i) => &post.slug[..=i],
        None => "",
    }
}

/// Media references without a scheme, host or leading slash
fn is_relative(src: &str) -> bool {
    !(src.is_empty()
        || src.starts_with('/')
        || src.starts_with('#')
        || src.starts_with("data:")
        || src.contains("://"))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> (TempDir, Folio) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content/blog");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-02-01\nsummary: First post\ntags: [Design, Rust]\n---\nBody.[^1]\n\n[^1]: A note\n",
        )
        .unwrap();
        fs::write(
            content.join("older.md"),
            "---\ntitle: Older\ndate: 2023-01-01\ntags: [Rust]\n---\n![clip](clip.mp4)\n",
        )
        .unwrap();
        fs::write(content.join("clip.mp4"), b"not really a video").unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        (dir, folio)
    }

    #[tokio::test]
    async fn test_generate_site() {
        let (_dir, folio) = site();
        let repo = folio.load().await.unwrap();
        Generator::new(&folio).generate(&repo).unwrap();

        let public = &folio.public_dir;
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Feb &#39;24"));
        assert!(index.find("Hello").unwrap() < index.find("Older").unwrap());
        assert!(index.contains("First post"));

        let post = fs::read_to_string(public.join("blog/hello/index.html")).unwrap();
        assert!(post.contains("A note"));
        assert!(post.contains(r#"href="/tags/design/""#));
        assert!(post.contains(r#"rel="prev""#));

        let older = fs::read_to_string(public.join("blog/older/index.html")).unwrap();
        assert!(older.contains(r#"<video controls preload="metadata"><source src="/clip.mp4">"#));

        assert!(public.join("tags/rust/index.html").exists());
        assert!(public.join("tags/design/index.html").exists());
        assert!(public.join("clip.mp4").exists());

        let search: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(public.join("search.json")).unwrap())
                .unwrap();
        assert_eq!(search[0]["slug"], "hello");
        assert_eq!(search[1]["url"], "/blog/older/");
    }

    #[tokio::test]
    async fn test_media_links_point_at_copied_assets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "root: /site/\n").unwrap();
        let trips = dir.path().join("content/blog/trips");
        fs::create_dir_all(trips.join("photos")).unwrap();
        fs::write(
            trips.join("rome.md"),
            "---\ntitle: Rome\n---\n![Forum](./photos/forum.png)\n\n![Map](https://maps.example/r.png)\n",
        )
        .unwrap();
        fs::write(trips.join("photos/forum.png"), b"png").unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        let repo = folio.load().await.unwrap();
        Generator::new(&folio).generate(&repo).unwrap();

        let page = fs::read_to_string(folio.public_dir.join("blog/trips/rome/index.html")).unwrap();
        assert!(page.contains(r#"<img src="/site/trips/photos/forum.png""#));
        assert!(page.contains(r#"srcset="/site/trips/photos/forum.webp""#));
        assert!(page.contains(r#"<img src="https://maps.example/r.png""#));

        // The URL under the root maps onto the copied file
        let copied = folio.public_dir.join("trips/photos/forum.png");
        assert!(copied.exists());
    }

    #[test]
    fn test_url_respects_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "root: /blog-root/\n").unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        let generator = Generator::new(&folio);
        assert_eq!(generator.url("blog/a/"), "/blog-root/blog/a/");
        assert_eq!(generator.url(""), "/blog-root/");
    }
}
