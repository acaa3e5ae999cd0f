//! Post model

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::FrontMatter;

/// Date sentinel used when a post has no date
pub const UNKNOWN_DATE: &str = "Unknown";

/// A blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Filename without the `.md` extension
    pub slug: String,

    /// Post title (falls back to the slug)
    pub title: String,

    /// Publication date as written, ideally `YYYY-MM-DD`
    pub date: String,

    /// One-line summary, may be empty
    pub summary: String,

    /// Post tags in header order
    pub tags: Vec<String>,

    /// Raw markdown body
    pub content: String,
}

impl Post {
    /// Build a post from a content file. Never fails: without a well-formed
    /// header every field falls back and the raw text becomes the content.
    pub fn parse(filename: &str, raw: &str) -> Self {
        let slug = slug_from_filename(filename);

        let Some((fm, body)) = FrontMatter::parse(raw) else {
            tracing::debug!("No front-matter in {}, using fallbacks", filename);
            return Self {
                title: slug.clone(),
                slug,
                date: UNKNOWN_DATE.to_string(),
                summary: String::new(),
                tags: Vec::new(),
                content: raw.to_string(),
            };
        };

        Self {
            title: fm.title().unwrap_or(&slug).to_string(),
            date: fm.date().unwrap_or(UNKNOWN_DATE).to_string(),
            summary: fm.summary().unwrap_or_default().to_string(),
            tags: fm.tags().map(<[String]>::to_vec).unwrap_or_default(),
            content: body.trim().to_string(),
            slug,
        }
    }

    /// Parse the date field, if it is a recognizable date
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// Compact list date: `2025-12-03` becomes `Dec '25`, anything else is
    /// returned unchanged
    pub fn display_date(&self) -> String {
        let Some((year, month)) = iso_year_month(&self.date) else {
            return self.date.clone();
        };
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(d) => format!("{} '{}", d.format("%b"), &self.date[2..4]),
            None => self.date.clone(),
        }
    }

    /// Whether any tag equals `tag`, ignoring case
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    /// Case-insensitive substring match on the title or any tag
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    /// URL path of the post page (without root)
    pub fn path(&self) -> String {
        format!("blog/{}/", self.slug)
    }
}

/// Strip the content extension from a filename
pub fn slug_from_filename(filename: &str) -> String {
    filename.strip_suffix(".md").unwrap_or(filename).to_string()
}

/// Strict `YYYY-MM-DD` split into (year, month)
fn iso_year_month(s: &str) -> Option<(i32, u32)> {
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    Some((s[0..4].parse().ok()?, s[5..7].parse().ok()?))
}

/// Parse a date string in the formats posts have used over time
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];
    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Month and year only ("Dec 2025", "December 2025")
    let first_of_month = format!("1 {}", s);
    for fmt in ["%d %b %Y", "%d %B %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&first_of_month, fmt) {
            return Some(d);
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // RFC 3339 / ISO 8601
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
