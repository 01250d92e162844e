//! Open Graph and Twitter card metadata

use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::BlogPost;
use crate::helpers::{date_iso, escape_html, full_url_for, truncate_with_ellipsis};

/// Longest title shown in a social preview
pub const MAX_TITLE_CHARS: usize = 60;
/// Longest description shown in a social preview
pub const MAX_DESCRIPTION_CHARS: usize = 160;

/// A single `<meta>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaTag {
    /// `property` for Open Graph, `name` for everything else
    pub attribute: &'static str,
    pub key: String,
    pub content: String,
}

impl MetaTag {
    fn property(key: &str, content: impl Into<String>) -> Self {
        Self {
            attribute: "property",
            key: key.to_string(),
            content: content.into(),
        }
    }

    fn name(key: &str, content: impl Into<String>) -> Self {
        Self {
            attribute: "name",
            key: key.to_string(),
            content: content.into(),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<meta {}="{}" content="{}">"#,
            self.attribute,
            escape_html(&self.key),
            escape_html(&self.content)
        )
    }
}

/// Social preview data for one page
#[derive(Debug, Clone, Serialize)]
pub struct SocialMeta {
    /// Document `<title>`
    pub page_title: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: String,
    pub image_alt: String,
    pub tags: Vec<MetaTag>,
}

impl SocialMeta {
    /// Metadata for an article page
    pub fn for_post(post: &BlogPost, site: &SiteConfig) -> Self {
        let title = truncate_with_ellipsis(&post.title, MAX_TITLE_CHARS);
        let description = match post.subtitle.as_deref() {
            Some(subtitle) => truncate_with_ellipsis(subtitle, MAX_DESCRIPTION_CHARS),
            None => format!(
                "Read about {} on the {}. By {}.",
                post.tags.join(", "),
                site.title,
                post.author
            ),
        };
        let url = full_url_for(site, &post.path());
        let image = full_url_for(site, &site.og_image);
        let image_alt = format!("{} - {}", post.title, site.title);

        let mut tags = vec![
            MetaTag::name("description", description.as_str()),
            MetaTag::property("og:type", "article"),
            MetaTag::property("og:url", url.as_str()),
            MetaTag::property("og:title", title.as_str()),
            MetaTag::property("og:description", description.as_str()),
        ];
        tags.extend(image_tags(site, &image, &image_alt));
        tags.push(MetaTag::property(
            "article:published_time",
            date_iso(&post.date),
        ));
        tags.push(MetaTag::property("article:author", post.author.as_str()));
        tags.extend(
            post.tags
                .iter()
                .map(|tag| MetaTag::property("article:tag", tag.as_str())),
        );
        tags.extend(twitter_tags(site, &url, &title, &description, &image, &image_alt));

        Self {
            page_title: format!("{} | {}", post.title, site.title),
            title,
            description,
            url,
            image,
            image_alt,
            tags,
        }
    }

    /// Site-wide metadata for the index page
    pub fn for_site(site: &SiteConfig) -> Self {
        let title = truncate_with_ellipsis(&site.title, MAX_TITLE_CHARS);
        let description = truncate_with_ellipsis(&site.description, MAX_DESCRIPTION_CHARS);
        let url = full_url_for(site, "/");
        let image = full_url_for(site, &site.og_image);
        let image_alt = site.title.clone();

        let mut tags = vec![
            MetaTag::name("description", description.as_str()),
            MetaTag::property("og:type", "website"),
            MetaTag::property("og:url", url.as_str()),
            MetaTag::property("og:title", title.as_str()),
            MetaTag::property("og:description", description.as_str()),
            MetaTag::property("og:site_name", site.title.as_str()),
        ];
        tags.extend(image_tags(site, &image, &image_alt));
        tags.extend(twitter_tags(site, &url, &title, &description, &image, &image_alt));

        Self {
            page_title: site.title.clone(),
            title,
            description,
            url,
            image,
            image_alt,
            tags,
        }
    }

    /// All `<meta>` elements, one per line
    pub fn render_tags(&self) -> String {
        self.tags
            .iter()
            .map(MetaTag::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn image_tags(site: &SiteConfig, image: &str, alt: &str) -> Vec<MetaTag> {
    vec![
        MetaTag::property("og:image", image),
        MetaTag::property("og:image:width", site.og_image_width.to_string()),
        MetaTag::property("og:image:height", site.og_image_height.to_string()),
        MetaTag::property("og:image:alt", alt),
    ]
}

fn twitter_tags(
    site: &SiteConfig,
    url: &str,
    title: &str,
    description: &str,
    image: &str,
    image_alt: &str,
) -> Vec<MetaTag> {
    let mut tags = vec![
        MetaTag::name("twitter:card", "summary_large_image"),
        MetaTag::name("twitter:url", url),
        MetaTag::name("twitter:title", title),
        MetaTag::name("twitter:description", description),
        MetaTag::name("twitter:image", image),
        MetaTag::name("twitter:image:alt", image_alt),
    ];
    if !site.twitter_site.is_empty() {
        tags.push(MetaTag::name("twitter:site", site.twitter_site.as_str()));
        tags.push(MetaTag::name("twitter:creator", site.twitter_site.as_str()));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn site() -> SiteConfig {
        SiteConfig {
            title: "Example Blog".to_string(),
            url: "https://blog.example.dev".to_string(),
            twitter_site: "@example".to_string(),
            ..Default::default()
        }
    }

    fn post(title: &str, subtitle: Option<&str>) -> BlogPost {
        BlogPost {
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            date: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            slug: "zk-intro".to_string(),
            tags: vec!["ZK".to_string(), "Security".to_string()],
            author: "Alice".to_string(),
            twitter: String::new(),
            content: String::new(),
        }
    }

    fn content_of<'a>(meta: &'a SocialMeta, key: &str) -> Vec<&'a str> {
        meta.tags
            .iter()
            .filter(|t| t.key == key)
            .map(|t| t.content.as_str())
            .collect()
    }

    #[test]
    fn test_short_title_kept() {
        let meta = SocialMeta::for_post(&post("Short", Some("sub")), &site());
        assert_eq!(meta.title, "Short");
        assert_eq!(meta.page_title, "Short | Example Blog");
    }

    #[test]
    fn test_long_title_truncated() {
        let title = "t".repeat(80);
        let meta = SocialMeta::for_post(&post(&title, None), &site());
        assert_eq!(meta.title, format!("{}...", "t".repeat(57)));
        assert_eq!(content_of(&meta, "og:title"), vec![meta.title.as_str()]);
    }

    #[test]
    fn test_long_subtitle_truncated() {
        let subtitle = "s".repeat(200);
        let meta = SocialMeta::for_post(&post("T", Some(&subtitle)), &site());
        assert_eq!(meta.description, format!("{}...", "s".repeat(157)));
    }

    #[test]
    fn test_description_without_subtitle() {
        let meta = SocialMeta::for_post(&post("T", None), &site());
        assert_eq!(
            meta.description,
            "Read about ZK, Security on the Example Blog. By Alice."
        );
    }

    #[test]
    fn test_article_tags() {
        let meta = SocialMeta::for_post(&post("T", None), &site());
        assert_eq!(meta.url, "https://blog.example.dev/zk-intro");
        assert_eq!(meta.image, "https://blog.example.dev/twitter.png");
        assert_eq!(content_of(&meta, "og:type"), vec!["article"]);
        assert_eq!(content_of(&meta, "article:tag"), vec!["ZK", "Security"]);
        assert_eq!(
            content_of(&meta, "article:published_time"),
            vec!["2024-03-05T00:00:00.000Z"]
        );
        assert_eq!(content_of(&meta, "twitter:creator"), vec!["@example"]);
    }

    #[test]
    fn test_url_encodes_slug() {
        let post = BlogPost {
            slug: "zk proofs 101".to_string(),
            ..post("T", None)
        };
        let meta = SocialMeta::for_post(&post, &site());
        assert_eq!(meta.url, "https://blog.example.dev/zk%20proofs%20101");
        assert_eq!(content_of(&meta, "og:url"), vec![meta.url.as_str()]);
        assert_eq!(content_of(&meta, "twitter:url"), vec![meta.url.as_str()]);
    }

    #[test]
    fn test_no_twitter_site() {
        let site = SiteConfig {
            twitter_site: String::new(),
            ..site()
        };
        let meta = SocialMeta::for_post(&post("T", None), &site);
        assert!(content_of(&meta, "twitter:creator").is_empty());
        assert_eq!(content_of(&meta, "twitter:card"), vec!["summary_large_image"]);
    }

    #[test]
    fn test_render_tags_escapes() {
        let meta = SocialMeta::for_post(&post(r#"Fees & "Gas""#, None), &site());
        let html = meta.render_tags();
        assert!(html.contains(r#"<meta property="og:title" content="Fees &amp; &quot;Gas&quot;">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
    }

    #[test]
    fn test_for_site() {
        let meta = SocialMeta::for_site(&site());
        assert_eq!(meta.url, "https://blog.example.dev");
        assert_eq!(content_of(&meta, "og:type"), vec!["website"]);
        assert_eq!(content_of(&meta, "og:site_name"), vec!["Example Blog"]);
    }
}
