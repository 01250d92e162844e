//! Content loader - loads posts from the content directory

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

use super::{sort_by_date_desc, BlogPost, ContentError, FrontMatter, MarkdownRenderer, PostSummary};
use crate::config::HighlightConfig;
use crate::Blog;

lazy_static! {
    /// A slug is a single path segment
    static ref SLUG_RE: Regex = Regex::new(r"^[^/\\\x00]+$").unwrap();
}

/// Loads posts from the content directory
pub struct ContentLoader {
    content_dir: PathBuf,
    default_author: String,
    highlight: HighlightConfig,
    /// Built on the first `load_post`; listings only read front matter
    renderer: OnceLock<MarkdownRenderer>,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new(blog: &Blog) -> Self {
        Self {
            content_dir: blog.content_dir.clone(),
            default_author: blog.config.default_author.clone(),
            highlight: blog.config.highlight.clone(),
            renderer: OnceLock::new(),
        }
    }

    fn renderer(&self) -> &MarkdownRenderer {
        self.renderer
            .get_or_init(|| MarkdownRenderer::with_options(&self.highlight))
    }

    /// Directory the posts are read from
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Load the index listing, newest first.
    ///
    /// Any unreadable or malformed post fails the whole listing.
    pub fn load_summaries(&self) -> Result<Vec<PostSummary>> {
        let mut posts = Vec::new();

        for path in self.markdown_files()? {
            let slug = slug_for(&path)?;
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let (fm, _) = FrontMatter::parse(&content)
                .with_context(|| format!("Failed to parse {:?}", path))?;

            let date = self.resolve_date(&fm, &path);
            posts.push(PostSummary {
                title: fm.title.clone().unwrap_or_else(|| slug.clone()),
                subtitle: non_empty(fm.subtitle.as_deref()),
                date,
                author: self.resolve_author(&fm),
                tags: normalize_tags(&fm.tags),
                slug,
            });
        }

        sort_by_date_desc(&mut posts);
        tracing::debug!("Loaded {} posts from {:?}", posts.len(), self.content_dir);

        Ok(posts)
    }

    /// Load and render a single post
    pub fn load_post(&self, slug: &str) -> Result<BlogPost, ContentError> {
        if !is_valid_slug(slug) {
            return Err(ContentError::InvalidSlug(slug.to_string()));
        }

        let path = self.content_dir.join(format!("{}.md", slug));
        if !path.is_file() {
            return Err(ContentError::NotFound(slug.to_string()));
        }

        let source = fs::read_to_string(&path).map_err(|source| ContentError::Io {
            path: path.clone(),
            source,
        })?;
        let processed = self
            .renderer()
            .process(&source)
            .map_err(|source| ContentError::Parse {
                path: path.clone(),
                source,
            })?;
        let fm = processed.front_matter;

        Ok(BlogPost {
            title: fm.title.clone().unwrap_or_else(|| slug.to_string()),
            subtitle: non_empty(fm.subtitle.as_deref()),
            date: self.resolve_date(&fm, &path),
            slug: slug.to_string(),
            tags: normalize_tags(&fm.tags),
            author: self.resolve_author(&fm),
            twitter: fm.twitter.clone().unwrap_or_default(),
            content: processed.content,
        })
    }

    /// Slugs of every post in the content directory
    pub fn slugs(&self) -> Result<Vec<String>> {
        self.markdown_files()?
            .iter()
            .map(|path| slug_for(path))
            .collect()
    }

    /// Markdown files directly inside the content directory, by file name
    fn markdown_files(&self) -> Result<Vec<PathBuf>> {
        if !self.content_dir.is_dir() {
            anyhow::bail!("Content directory not found: {:?}", self.content_dir);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.content_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("Failed to list {:?}", self.content_dir))?;
            let path = entry.path();
            if path.is_file() && is_markdown_file(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    fn resolve_author(&self, fm: &FrontMatter) -> String {
        non_empty(fm.author.as_deref()).unwrap_or_else(|| self.default_author.clone())
    }

    /// Front-matter date, else the file's mtime, else now
    fn resolve_date(&self, fm: &FrontMatter, path: &Path) -> DateTime<Utc> {
        if let Some(date) = fm.parse_date() {
            return date;
        }
        if let Some(raw) = &fm.date {
            tracing::warn!("Unrecognized date {:?} in {:?}", raw, path);
        }

        fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now())
    }
}

/// Check if a file is a markdown post
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md")
        .unwrap_or(false)
}

/// File name without the `.md` suffix
fn slug_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("Non UTF-8 file name: {:?}", path))
}

pub(crate) fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug) && slug != "." && slug != ".."
}

/// Trim tags, drop empty ones and duplicates, keep first-seen order
fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
