//! Content loader - discovers and reads posts from the content directory

use std::path::Path;
use tokio::task::JoinSet;
use walkdir::WalkDir;

use super::{Post, PostRepository};
use crate::error::ContentError;
use crate::Folio;

/// Loads posts from the content directory
pub struct ContentLoader<'a> {
    folio: &'a Folio,
}

impl<'a> ContentLoader<'a> {
    pub fn new(folio: &'a Folio) -> Self {
        Self { folio }
    }

    /// Content file names relative to the content directory. The configured
    /// manifest wins; otherwise the directory is walked for `*.md` files.
    pub fn discover(&self) -> Result<Vec<String>, ContentError> {
        let content_dir = &self.folio.content_dir;
        if !content_dir.exists() {
            return Err(ContentError::ContentDirMissing(content_dir.clone()));
        }

        if let Some(manifest) = &self.folio.config.manifest {
            return Ok(manifest.clone());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| ContentError::Walk {
                path: content_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && is_markdown_file(path) {
                let relative = path.strip_prefix(content_dir).unwrap_or(path);
                files.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }

        Ok(files)
    }

    /// Read and parse every discovered file concurrently. Files that cannot
    /// be read are logged and skipped; the rest keep discovery order.
    pub async fn load_posts(&self) -> Result<Vec<Post>, ContentError> {
        let files = self.discover()?;
        tracing::debug!("Discovered {} content files", files.len());

        let mut tasks = JoinSet::new();
        for (index, name) in files.into_iter().enumerate() {
            let path = self.folio.content_dir.join(&name);
            tasks.spawn(async move {
                let result = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| ContentError::Read { path, source });
                (index, name, result)
            });
        }

        let mut loaded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, name, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!("Content load task failed: {}", e);
                    continue;
                }
            };
            match result {
                Ok(raw) => loaded.push((index, Post::parse(&name, &raw))),
                Err(e) => tracing::warn!("Skipping {}: {}", name, e),
            }
        }

        loaded.sort_by_key(|(index, _)| *index);
        Ok(loaded.into_iter().map(|(_, post)| post).collect())
    }

    /// Load all posts into a newest-first repository snapshot
    pub async fn load(&self) -> Result<PostRepository, ContentError> {
        let posts = self.load_posts().await?;
        let repo = PostRepository::new(posts).sorted_newest_first();
        tracing::info!("Loaded {} posts", repo.len());
        Ok(repo)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md")
        .unwrap_or(false)
}
