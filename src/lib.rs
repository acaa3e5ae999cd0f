//! folio-rs: a personal blog content pipeline
//!
//! Markdown posts with a small frontmatter header are loaded into an
//! in-memory repository, rendered to structured documents (with inline
//! footnotes and image/video substitution) and written out as static HTML.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::html::RenderContext;
use content::loader::ContentLoader;
use content::{MarkdownRenderer, PostRepository};

/// The main Folio application
#[derive(Debug, Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content directory holding the markdown posts
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Folio {
    /// Create a new Folio instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("_config.yml")
    }

    /// Load every post into a newest-first snapshot
    pub async fn load(&self) -> Result<PostRepository> {
        Ok(ContentLoader::new(self).load().await?)
    }

    /// Re-read the configuration and build a fresh snapshot. The caller
    /// swaps both in whole; nothing is patched in place.
    pub async fn reload(&self) -> Result<(Self, PostRepository)> {
        let folio = Self::new(&self.base_dir)?;
        let repo = folio.load().await?;
        Ok((folio, repo))
    }

    /// Generate the static site
    pub async fn build(&self) -> Result<PostRepository> {
        commands::build::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, slug: Option<&str>) -> Result<PathBuf> {
        commands::new::create_post(self, title, slug)
    }

    /// Markdown renderer configured from `markdown` in the site config
    pub fn markdown_renderer(&self) -> MarkdownRenderer {
        MarkdownRenderer::with_config(&self.config.markdown)
    }

    /// Presentation context configured from `theme` in the site config
    pub fn render_context(&self) -> RenderContext {
        RenderContext::from(&self.config.theme)
    }
}
