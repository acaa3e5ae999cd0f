//! List posts

use anyhow::Result;

use crate::content::{Post, PostRepository};
use crate::Folio;

/// Posts matching an optional tag and an optional title/tag query,
/// newest first
pub fn select<'a>(
    repo: &'a PostRepository,
    tag: Option<&str>,
    query: Option<&str>,
) -> Vec<&'a Post> {
    repo.all()
        .filter(|p| tag.map_or(true, |t| p.has_tag(t)))
        .filter(|p| query.map_or(true, |q| p.matches_query(q)))
        .collect()
}

/// One listing line: date, title, slug and tags
pub fn format_line(post: &Post) -> String {
    let mut line = format!("  {} - {} [{}]", post.date, post.title, post.slug);
    if !post.tags.is_empty() {
        line.push_str(&format!(" #{}", post.tags.join(" #")));
    }
    line
}

/// List posts
pub async fn run(folio: &Folio, tag: Option<&str>, query: Option<&str>) -> Result<()> {
    let repo = folio.load().await?;
    let posts = select(&repo, tag, query);

    println!("Posts ({}):", posts.len());
    for post in posts {
        println!("{}", format_line(post));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> PostRepository {
        PostRepository::new(vec![
            Post::parse(
                "ai-art.md",
                "---\ntitle: AI and Art\ndate: 2024-05-01\ntags: [AI, Art]\n---\n",
            ),
            Post::parse(
                "minimal.md",
                "---\ntitle: Minimal Design\ndate: 2024-04-01\ntags: [Design]\n---\n",
            ),
            Post::parse("untitled.md", "just text"),
        ])
        .sorted_newest_first()
    }

    #[test]
    fn test_select_all() {
        let repo = repo();
        let slugs: Vec<_> = select(&repo, None, None).iter().map(|p| p.slug.clone()).collect();
        assert_eq!(slugs, vec!["ai-art", "minimal", "untitled"]);
    }

    #[test]
    fn test_select_by_tag_and_query() {
        let repo = repo();
        let by_tag = select(&repo, Some("art"), None);
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].slug, "ai-art");

        let by_query = select(&repo, None, Some("design"));
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].slug, "minimal");

        assert!(select(&repo, Some("ai"), Some("design")).is_empty());
    }

    #[test]
    fn test_format_line() {
        let repo = repo();
        let post = repo.get_by_slug("ai-art").unwrap();
        assert_eq!(format_line(post), "  2024-05-01 - AI and Art [ai-art] #AI #Art");
        let post = repo.get_by_slug("untitled").unwrap();
        assert_eq!(format_line(post), "  Unknown - untitled [untitled]");
    }
}
