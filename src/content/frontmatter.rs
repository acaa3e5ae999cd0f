//! Front-matter parsing
//!
//! Content files open with a `---` delimited header of `key: value` lines.
//! Values are either scalars (optionally quoted) or bracketed, comma separated
//! lists:
//!
//! ```text
//! ---
//! title: "Hello"
//! date: 2024-01-15
//! tags: [rust, notes]
//! ---
//! Body text.
//! ```

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Whole-input match: opening delimiter, lazy header, closing delimiter, body
    static ref FRONT_MATTER: Regex =
        Regex::new(r"\A---\s*([\s\S]*?)\s*---\s*([\s\S]*)\z").expect("front-matter regex");
}

/// A decoded metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Scalar(String),
    List(Vec<String>),
}

impl MetaValue {
    /// Decode a raw (already trimmed) value
    pub fn decode(raw: &str) -> Self {
        let raw = raw.trim();

        if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
            let inner = &raw[1..raw.len() - 1];
            if inner.trim().is_empty() {
                return MetaValue::List(Vec::new());
            }
            return MetaValue::List(inner.split(',').map(|s| s.trim().to_string()).collect());
        }

        MetaValue::Scalar(strip_quotes(raw).to_string())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            MetaValue::Scalar(s) => Some(s),
            MetaValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            MetaValue::List(items) => Some(items),
            MetaValue::Scalar(_) => None,
        }
    }
}

/// Strip one layer of matching single or double quotes
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Front-matter data from a content file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: IndexMap<String, MetaValue>,
}

impl FrontMatter {
    /// Parse front-matter from content string.
    /// Returns (front_matter, remaining_content), or `None` when the input
    /// does not carry a well-formed delimited header.
    pub fn parse(content: &str) -> Option<(Self, &str)> {
        let caps = FRONT_MATTER.captures(content)?;
        let header = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str());

        Some((Self::parse_block(header), body))
    }

    /// Parse the lines of a header block. Lines without a colon are skipped;
    /// only the first colon separates key from value.
    pub fn parse_block(block: &str) -> Self {
        let mut fields = IndexMap::new();

        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            fields.insert(key.trim().to_string(), MetaValue::decode(value));
        }

        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    /// A scalar field; list values under this key are ignored
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_scalar)
    }

    /// A list field; scalar values under this key are ignored
    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(MetaValue::as_list)
    }

    pub fn title(&self) -> Option<&str> {
        self.non_empty_scalar("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.non_empty_scalar("date")
    }

    pub fn summary(&self) -> Option<&str> {
        self.non_empty_scalar("summary")
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.list("tags")
    }

    /// Keys in header order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn non_empty_scalar(&self, key: &str) -> Option<&str> {
        self.scalar(key).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15
summary: "A short note"
tags: [rust, notes]
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), Some("Hello World"));
        assert_eq!(fm.date(), Some("2024-01-15"));
        assert_eq!(fm.summary(), Some("A short note"));
        assert_eq!(fm.tags().unwrap(), ["rust", "notes"]);
        assert!(remaining.contains("This is the content."));
    }

    #[test]
    fn test_no_header() {
        assert!(FrontMatter::parse("Just some text").is_none());
        assert!(FrontMatter::parse("intro\n---\ntitle: x\n---\n").is_none());
    }

    #[test]
    fn test_unclosed_header() {
        assert!(FrontMatter::parse("---\ntitle: Dangling\n\nBody").is_none());
    }

    #[test]
    fn test_first_colon_splits() {
        let fm = FrontMatter::parse_block("title: Notes: part two\nsummary: see https://example.com");
        assert_eq!(fm.title(), Some("Notes: part two"));
        assert_eq!(fm.summary(), Some("see https://example.com"));
    }

    #[test]
    fn test_line_without_colon_skipped() {
        let fm = FrontMatter::parse_block("just words\ntitle: Kept");
        assert_eq!(fm.keys().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn test_decode_lists() {
        assert_eq!(
            MetaValue::decode("[alpha, beta , gamma]"),
            MetaValue::List(vec!["alpha".into(), "beta".into(), "gamma".into()])
        );
        assert_eq!(MetaValue::decode("[]"), MetaValue::List(vec![]));
        assert_eq!(MetaValue::decode("[  ]"), MetaValue::List(vec![]));
    }

    #[test]
    fn test_decode_quotes() {
        assert_eq!(MetaValue::decode("\"quoted\""), MetaValue::Scalar("quoted".into()));
        assert_eq!(MetaValue::decode("'single'"), MetaValue::Scalar("single".into()));
        // Mismatched quotes are left alone
        assert_eq!(MetaValue::decode("\"half'"), MetaValue::Scalar("\"half'".into()));
        // Only one layer is stripped
        assert_eq!(MetaValue::decode("\"'nested'\""), MetaValue::Scalar("'nested'".into()));
    }

    #[test]
    fn test_shape_mismatch_ignored() {
        let fm = FrontMatter::parse_block("title: [a, b]\ntags: solo");
        assert_eq!(fm.title(), None);
        assert_eq!(fm.tags(), None);
        assert!(fm.get("title").is_some());
    }

    #[test]
    fn test_later_key_overwrites() {
        let fm = FrontMatter::parse_block("title: First\ntitle: Second");
        assert_eq!(fm.title(), Some("Second"));
    }
}
