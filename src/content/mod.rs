//! Content module - posts, the post repository, and markdown rendering

mod document;
pub mod footnote;
mod frontmatter;
pub mod html;
pub mod loader;
mod markdown;
mod post;
mod repository;

pub use document::{Document, Node};
pub use footnote::{extract_footnotes, FootnoteTable};
pub use frontmatter::{FrontMatter, MetaValue};
pub use html::{HtmlRenderer, RenderContext};
pub use markdown::{MarkdownRenderer, CODE_LABEL};
pub use post::{parse_date, slug_from_filename, Post, UNKNOWN_DATE};
pub use repository::{compare_newest_first, sort_newest_first, PostRepository};
