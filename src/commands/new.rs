//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Folio;

/// Frontmatter scaffold for a fresh post
fn scaffold(title: &str, date: &str) -> String {
    format!(
        "---\ntitle: {}\ndate: {}\nsummary: \"\"\ntags: []\n---\n\n",
        title, date
    )
}

/// Create a new post in the content directory. The slug defaults to the
/// slugified title.
pub fn create_post(folio: &Folio, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => s.trim_end_matches(".md").to_string(),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title: {:?}", title);
    }

    fs::create_dir_all(&folio.content_dir)?;
    let file_path = folio.content_dir.join(format!("{}.md", slug));

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    fs::write(&file_path, scaffold(title, &today))?;

    if folio.config.manifest.is_some() {
        tracing::warn!(
            "A manifest is configured; add {}.md to it for the post to load",
            slug
        );
    }

    println!("Created: {:?}", file_path);

    Ok(file_path)
}
