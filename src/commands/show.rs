//! Show a single post

use anyhow::Result;

use crate::content::html::HtmlRenderer;
use crate::content::{Document, Post};
use crate::Folio;

/// Output format for `show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFormat {
    #[default]
    Text,
    Html,
    Json,
}

/// Render the post with `slug` in the requested format
pub async fn render(folio: &Folio, slug: &str, format: ShowFormat) -> Result<String> {
    let repo = folio.load().await?;
    let Some(post) = repo.get_by_slug(slug) else {
        anyhow::bail!("Post not found: {}", slug);
    };

    let doc = folio.markdown_renderer().render(&post.content);
    let out = match format {
        ShowFormat::Text => render_text(post, &doc),
        ShowFormat::Html => HtmlRenderer::new().render(&doc, &folio.render_context()),
        ShowFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "post": post,
            "document": doc,
        }))?,
    };

    Ok(out)
}

/// Show a post
pub async fn run(folio: &Folio, slug: &str, format: ShowFormat) -> Result<()> {
    println!("{}", render(folio, slug, format).await?);
    Ok(())
}

/// Plain-text view: header, one block per line group, then the footnotes
fn render_text(post: &Post, doc: &Document) -> String {
    let mut out = format!("{}\n{}", post.title, post.date);
    if !post.tags.is_empty() {
        out.push_str(&format!("  #{}", post.tags.join(" #")));
    }
    out.push('\n');

    for node in &doc.nodes {
        out.push('\n');
        out.push_str(node.plain_text().trim_end());
        out.push('\n');
    }

    let notes: Vec<_> = doc.footnotes().collect();
    if !notes.is_empty() {
        out.push('\n');
        for (id, text) in notes {
            out.push_str(&format!("[{}] {}\n", id, text));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, Folio) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content/blog");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("notes.md"),
            "---\ntitle: Notes\ndate: 2024-01-01\ntags: [Misc]\n---\nClaim.[^a]\n\n[^a]: Detail text\n",
        )
        .unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        (dir, folio)
    }

    #[tokio::test]
    async fn test_show_text() {
        let (_dir, folio) = site();
        let out = render(&folio, "notes", ShowFormat::Text).await.unwrap();
        assert!(out.starts_with("Notes\n2024-01-01  #Misc\n"));
        assert!(out.contains("Claim.[a]"));
        assert!(out.ends_with("[a] Detail text\n"));
    }

    #[tokio::test]
    async fn test_show_json() {
        let (_dir, folio) = site();
        let out = render(&folio, "notes", ShowFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["post"]["slug"], "notes");
        assert_eq!(value["document"]["nodes"][0]["kind"], "paragraph");
    }

    #[tokio::test]
    async fn test_show_unknown_slug() {
        let (_dir, folio) = site();
        let err = render(&folio, "missing", ShowFormat::Html).await.unwrap_err();
        assert_eq!(err.to_string(), "Post not found: missing");
    }
}
