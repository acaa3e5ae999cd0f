//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,

    /// Explicit list of content files, relative to `content_dir`.
    /// When absent the content directory is walked for `*.md` files.
    pub manifest: Option<Vec<String>>,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub markdown: MarkdownConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Folio".to_string(),
            author: "John Doe".to_string(),
            description: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            content_dir: "content/blog".to_string(),
            public_dir: "public".to_string(),
            manifest: None,

            theme: ThemeConfig::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Light or dark presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Light,
    Dark,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Light => "light",
            Mode::Dark => "dark",
        }
    }
}

/// Accent color used for links, borders and markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    #[default]
    Red,
    Orange,
    Blue,
    Green,
}

impl Accent {
    pub fn name(self) -> &'static str {
        match self {
            Accent::Red => "red",
            Accent::Orange => "orange",
            Accent::Blue => "blue",
            Accent::Green => "green",
        }
    }
}

/// Theme selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub mode: Mode,
    pub accent: Accent,
}

/// Markdown rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Extension offered as a lighter alternative for still images
    pub alternate_format: String,
    /// Image extensions that get an alternate source hint
    pub still_extensions: Vec<String>,
    /// Image extensions rendered as a video player
    pub video_extensions: Vec<String>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            alternate_format: "webp".to_string(),
            still_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            video_extensions: vec!["mp4".to_string(), "webm".to_string(), "mov".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "content/blog");
        assert_eq!(config.theme.mode, Mode::Light);
        assert_eq!(config.theme.accent, Accent::Red);
        assert_eq!(config.markdown.alternate_format, "webp");
        assert!(config.manifest.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Field Notes
author: Test User
manifest:
  - first.md
  - second.md
theme:
  mode: dark
  accent: blue
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Field Notes");
        assert_eq!(config.author, "Test User");
        assert_eq!(
            config.manifest,
            Some(vec!["first.md".to_string(), "second.md".to_string()])
        );
        assert_eq!(config.theme.mode, Mode::Dark);
        assert_eq!(config.theme.accent, Accent::Blue);
        // Untouched sections keep their defaults
        assert_eq!(config.public_dir, "public");
        assert_eq!(config.markdown.video_extensions, vec!["mp4", "webm", "mov"]);
    }
}
