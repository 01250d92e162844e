//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Site
title: Blog
description: ''
language: en
default_author: Anonymous

# URL
url: http://localhost:4000
og_image: twitter.png
twitter_site: ''

# Directory
content_dir: content
public_dir: public
static_dir: static

# Writing
highlight:
  enable: true
  theme: base16-ocean.dark
  line_number: false
math: true
mermaid: true
"#;

const HELLO_WORLD: &str = r#"---
title: Hello World
subtitle: The first post on this blog
date: 2024-01-01
tags:
  - meta
author: Anonymous
---

Welcome! Edit or delete this file in `content/`, then run `inkpost server`.

```rust
fn main() {
    println!("hello, world");
}
```
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content"))?;
    fs::create_dir_all(target_dir.join("static"))?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        tracing::warn!("{:?} already exists, leaving it untouched", config_path);
    } else {
        fs::write(&config_path, DEFAULT_CONFIG)?;
    }

    let hello = target_dir.join("content/hello-world.md");
    if !hello.exists() {
        fs::write(&hello, HELLO_WORLD)?;
    }

    Ok(())
}
