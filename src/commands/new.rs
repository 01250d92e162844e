//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Blog;

/// Front-matter written into a new post
const SCAFFOLD: &str = r#"---
title: "{{ title }}"
subtitle: ""
date: {{ date }}
tags: []
author: {{ author }}
twitter: ""
---

"#;

/// Create a new post in the content directory.
///
/// The file name is `name` when given, otherwise the slugified title.
pub fn create_post(blog: &Blog, title: &str, name: Option<&str>) -> Result<PathBuf> {
    let now = chrono::Utc::now();

    let slug = match name {
        Some(name) => name.trim_end_matches(".md").to_string(),
        None => slug::slugify(title),
    };
    if slug.is_empty() || !crate::content::loader::is_valid_slug(&slug) {
        anyhow::bail!("Cannot derive a file name from {:?}", title);
    }

    fs::create_dir_all(&blog.content_dir)?;
    let file_path = blog.content_dir.join(format!("{}.md", slug));

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let content = SCAFFOLD
        .replace("{{ title }}", &title.replace('"', "\\\""))
        .replace("{{ date }}", &now.format("%Y-%m-%d").to_string())
        .replace("{{ author }}", &blog.config.default_author);

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
