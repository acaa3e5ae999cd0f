//! Generate static files

use anyhow::Result;

use crate::content::PostRepository;
use crate::generator::Generator;
use crate::Folio;

/// Load every post and write the site. Returns the snapshot that was built.
pub async fn run(folio: &Folio) -> Result<PostRepository> {
    let start = std::time::Instant::now();

    let repo = folio.load().await?;
    Generator::new(folio).generate(&repo)?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        repo.len(),
        duration.as_secs_f64()
    );

    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_writes_public_dir() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content/blog");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("first.md"), "---\ntitle: First\n---\nHi").unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        let repo = run(&folio).await.unwrap();
        assert_eq!(repo.len(), 1);
        assert!(folio.public_dir.join("index.html").exists());
        assert!(folio.public_dir.join("blog/first/index.html").exists());
    }

    #[tokio::test]
    async fn test_build_fails_without_content_dir() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        assert!(run(&folio).await.is_err());
        assert!(!folio.public_dir.exists());
    }
}
