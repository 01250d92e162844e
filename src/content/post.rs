//! Blog post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::helpers::{date_iso, post_path};

/// A blog post, rendered and ready for its article page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    /// Post title
    pub title: String,

    /// Optional one-line summary
    pub subtitle: Option<String>,

    /// Publication date
    pub date: DateTime<Utc>,

    /// URL segment, from the file name
    pub slug: String,

    /// Post tags, duplicates removed, in source order
    pub tags: Vec<String>,

    pub author: String,

    /// Author's social profile link; empty when not given
    pub twitter: String,

    /// Rendered HTML content
    pub content: String,
}

impl BlogPost {
    /// Site-relative URL of this post
    pub fn path(&self) -> String {
        post_path(&self.slug)
    }
}

/// A post as listed on the index page (no body)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub title: String,
    pub subtitle: Option<String>,
    pub date: DateTime<Utc>,
    pub slug: String,
    pub author: String,
    pub tags: Vec<String>,
}

impl PostSummary {
    /// Site-relative URL of this post
    pub fn path(&self) -> String {
        post_path(&self.slug)
    }

    /// Shape published in search.json
    pub fn to_search_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title,
            "subtitle": self.subtitle,
            "date": date_iso(&self.date),
            "slug": self.slug,
            "url": self.path(),
            "author": self.author,
            "tags": self.tags,
        })
    }
}

/// Sort newest first; equal dates keep their relative order
pub fn sort_by_date_desc(posts: &mut [PostSummary]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(slug: &str, day: u32) -> PostSummary {
        PostSummary {
            title: slug.to_string(),
            subtitle: None,
            date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            slug: slug.to_string(),
            author: "Anonymous".to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_sort_by_date_desc() {
        let mut posts = vec![summary("old", 1), summary("new", 20), summary("mid", 10)];
        sort_by_date_desc(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_search_entry() {
        let entry = summary("hello", 5).to_search_entry();
        assert_eq!(entry["url"], "/hello");
        assert_eq!(entry["date"], "2024-01-05T00:00:00.000Z");
        assert!(entry["subtitle"].is_null());
    }
}
