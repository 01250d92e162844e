//! Generator module - writes the static site using the built-in templates

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::{ContentLoader, PostSummary};
use crate::search::SearchQuery;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// What a build produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub posts_listed: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
    pub assets_copied: usize,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    loader: ContentLoader,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            loader: ContentLoader::new(blog),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site
    pub fn generate(&self) -> Result<BuildReport> {
        fs::create_dir_all(&self.blog.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.blog.public_dir))?;

        let mut report = BuildReport {
            assets_copied: self.copy_static_assets()?,
            ..Default::default()
        };

        let posts = self.load_listing();
        report.posts_listed = posts.len();

        self.generate_index(&posts)?;
        self.generate_search_index(&posts)?;
        self.generate_not_found()?;

        let (written, failed) = self.generate_post_pages()?;
        report.pages_written = written;
        report.pages_failed = failed;

        Ok(report)
    }

    /// The index listing; a failure yields an empty list
    fn load_listing(&self) -> Vec<PostSummary> {
        match self.loader.load_summaries() {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!("Error fetching blogs: {:#}", e);
                Vec::new()
            }
        }
    }

    fn generate_index(&self, posts: &[PostSummary]) -> Result<()> {
        let html = self
            .renderer
            .render_index(&self.blog.config, posts, &SearchQuery::default())?;
        write_file(&self.blog.public_dir.join("index.html"), &html)?;
        tracing::debug!("Generated index with {} posts", posts.len());
        Ok(())
    }

    /// One page per slug; a post that fails to load is skipped
    fn generate_post_pages(&self) -> Result<(usize, usize)> {
        let slugs = match self.loader.slugs() {
            Ok(slugs) => slugs,
            Err(e) => {
                tracing::error!("Error listing posts: {:#}", e);
                return Ok((0, 0));
            }
        };

        let mut written = 0;
        let mut failed = 0;
        for slug in slugs {
            let post = match self.loader.load_post(&slug) {
                Ok(post) => post,
                Err(e) => {
                    tracing::error!("Error fetching report {}: {}", slug, e);
                    failed += 1;
                    continue;
                }
            };

            let html = self.renderer.render_post(&self.blog.config, &post)?;
            let output_path = self.blog.public_dir.join(&slug).join("index.html");
            write_file(&output_path, &html)?;
            tracing::debug!("Generated post: {:?}", output_path);
            written += 1;
        }

        Ok((written, failed))
    }

    fn generate_not_found(&self) -> Result<()> {
        let html = self.renderer.render_not_found(&self.blog.config)?;
        write_file(&self.blog.public_dir.join("404.html"), &html)
    }

    /// Generate search index (JSON)
    fn generate_search_index(&self, posts: &[PostSummary]) -> Result<()> {
        let search_data: Vec<serde_json::Value> =
            posts.iter().map(PostSummary::to_search_entry).collect();

        let json = serde_json::to_string_pretty(&search_data)?;
        write_file(&self.blog.public_dir.join("search.json"), &json)?;
        tracing::debug!("Generated search.json");

        Ok(())
    }

    /// Copy static assets (images, styles, ...) to the public directory
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.is_dir() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn blog_with(files: &[(&str, &str)]) -> (TempDir, Blog) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let blog = Blog::new(dir.path()).unwrap();
        (dir, blog)
    }

    #[test]
    fn test_generate_site() {
        let (_dir, blog) = blog_with(&[
            (
                "content/first.md",
                "---\ntitle: First\ndate: 2024-01-01\ntags: [zk]\n---\nHello",
            ),
            (
                "content/second.md",
                "---\ntitle: Second\ndate: 2024-02-01\n---\nWorld",
            ),
            ("static/twitter.png", "png"),
            ("static/css/style.css", "body {}"),
        ]);

        let report = Generator::new(&blog).unwrap().generate().unwrap();
        assert_eq!(
            report,
            BuildReport {
                posts_listed: 2,
                pages_written: 2,
                pages_failed: 0,
                assets_copied: 2,
            }
        );

        let public = &blog.public_dir;
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        let second = index.find("/second").unwrap();
        let first = index.find("/first").unwrap();
        assert!(second < first, "newest post is listed first");

        let post = fs::read_to_string(public.join("first/index.html")).unwrap();
        assert!(post.contains("<p>Hello</p>"));
        assert!(post.contains(r#"content="article""#));

        assert!(public.join("404.html").exists());
        assert!(public.join("twitter.png").exists());
        assert!(public.join("css/style.css").exists());

        let search: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(public.join("search.json")).unwrap())
                .unwrap();
        assert_eq!(search.len(), 2);
        assert_eq!(search[0]["slug"], "second");
    }

    #[test]
    fn test_static_index_filters_in_browser() {
        let (_dir, blog) = blog_with(&[
            (
                "content/a.md",
                "---\ntitle: Proof Systems\nsubtitle: SNARKs\ntags: [ZK]\n---\na",
            ),
            ("content/b.md", "---\ntitle: Gas\ntags: [EVM]\n---\nb"),
        ]);
        Generator::new(&blog).unwrap().generate().unwrap();

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        // every card ships visible, with the fields the script matches on
        assert!(index.contains(
            r#"<article class="card" data-slug="a" data-title="Proof Systems" data-subtitle="SNARKs">"#
        ));
        assert!(index.contains(r#"<article class="card" data-slug="b" data-title="Gas">"#));
        assert!(index.contains(r#"<span class="tag" data-tag="ZK">ZK</span>"#));
        assert!(index.contains(r#"data-tag="EVM">EVM</a>"#));
        assert!(index.contains("<script>"));
        assert!(index.contains(r#"params.get("tag")"#));
        assert!(index.contains("history.replaceState"));
        assert!(index.contains(r#"data-no-matches="No blogs found matching your search.""#));
        assert!(index.contains(r#"<div class="empty" hidden>"#));
    }

    #[test]
    fn test_broken_post_empties_index_but_keeps_others() {
        let (_dir, blog) = blog_with(&[
            ("content/good.md", "---\ntitle: Good\n---\nfine"),
            ("content/bad.md", "---\ntitle: [oops\n---\n"),
        ]);

        let report = Generator::new(&blog).unwrap().generate().unwrap();
        assert_eq!(report.posts_listed, 0);
        assert_eq!(report.pages_written, 1);
        assert_eq!(report.pages_failed, 1);

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(index.contains("<p>No blogs available.</p>"));
        assert!(blog.public_dir.join("good/index.html").exists());
        assert!(!blog.public_dir.join("bad/index.html").exists());
    }

    #[test]
    fn test_missing_content_dir_still_builds() {
        let (_dir, blog) = blog_with(&[]);
        let report = Generator::new(&blog).unwrap().generate().unwrap();
        assert_eq!(report, BuildReport::default());
        assert!(blog.public_dir.join("index.html").exists());
    }
}
