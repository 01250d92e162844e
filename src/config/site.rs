//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    /// Author used when a post does not name one
    pub default_author: String,

    // URL
    pub url: String,
    /// Social preview image, relative to `url`
    pub og_image: String,
    pub og_image_width: u32,
    pub og_image_height: u32,
    /// Handle published as `twitter:site` / `twitter:creator`
    pub twitter_site: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    pub static_dir: String,

    // Writing
    #[serde(default)]
    pub highlight: HighlightConfig,
    /// Load KaTeX assets on article pages
    pub math: bool,
    /// Load mermaid on article pages
    pub mermaid: bool,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: String::new(),
            language: "en".to_string(),
            default_author: "Anonymous".to_string(),

            url: "http://localhost:4000".to_string(),
            og_image: "twitter.png".to_string(),
            og_image_width: 1200,
            og_image_height: 630,
            twitter_site: String::new(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            highlight: HighlightConfig::default(),
            math: true,
            mermaid: true,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    /// Name of a syntect bundled theme
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.default_author, "Anonymous");
        assert_eq!(config.content_dir, "content");
        assert!(config.highlight.enable);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: yAudit Blog
url: https://blog.example.dev/
twitter_site: "@example"
highlight:
  theme: InspiredGitHub
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "yAudit Blog");
        assert_eq!(config.base_url(), "https://blog.example.dev");
        assert_eq!(config.twitter_site, "@example");
        assert_eq!(config.highlight.theme, "InspiredGitHub");
        // untouched keys keep their defaults
        assert_eq!(config.public_dir, "public");
        assert!(config.highlight.enable);
    }
}
