//! In-memory post collection

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::Post;

/// Newest-first comparison on post dates. Posts whose date does not parse
/// go after every dated post; two undated posts compare equal, so a stable
/// sort leaves them in their relative order.
pub fn compare_newest_first(a: &Post, b: &Post) -> Ordering {
    match (a.parsed_date(), b.parsed_date()) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort posts by date, newest first
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(compare_newest_first);
}

/// An immutable snapshot of all loaded posts, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct PostRepository {
    posts: IndexMap<String, Post>,
}

impl PostRepository {
    /// Build a repository keeping the given order. A later post with an
    /// already seen slug replaces the earlier one in place.
    pub fn new(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut map: IndexMap<String, Post> = IndexMap::new();
        for post in posts {
            if let Some(previous) = map.insert(post.slug.clone(), post) {
                tracing::warn!(
                    "Duplicate slug '{}': replacing earlier post \"{}\"",
                    previous.slug,
                    previous.title
                );
            }
        }
        Self { posts: map }
    }

    /// Reorder newest first
    pub fn sorted_newest_first(mut self) -> Self {
        self.posts.sort_by(|_, a, _, b| compare_newest_first(a, b));
        self
    }

    /// All posts in repository order
    pub fn all(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Post> {
        self.posts.get(slug)
    }

    /// Posts carrying `tag`, ignoring case
    pub fn get_by_tag(&self, tag: &str) -> Vec<&Post> {
        self.all().filter(|p| p.has_tag(tag)).collect()
    }

    /// Every tag used by any post, deduplicated and sorted
    pub fn all_tags(&self) -> Vec<String> {
        self.all()
            .flat_map(|p| p.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of posts per tag
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for post in self.all() {
            for tag in &post.tags {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Posts whose title or tags contain `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&Post> {
        self.all().filter(|p| p.matches_query(query)).collect()
    }
}
