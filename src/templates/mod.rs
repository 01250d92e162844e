//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded directly in the binary. The same renderer backs
//! the static build and the server, so both produce identical pages.

use anyhow::Result;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{BlogPost, PostSummary};
use crate::helpers::{date_iso, escape_html, index_url, month_year, short_date};
use crate::meta::SocialMeta;
use crate::search::{self, SearchQuery};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Leave `/` unescaped in hrefs
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            // Partials
            ("partials/head.html", include_str!("theme/partials/head.html")),
            ("partials/card.html", include_str!("theme/partials/card.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Index page: every post, those not matching `query` hidden, with the tag selector
    pub fn render_index(
        &self,
        config: &SiteConfig,
        posts: &[PostSummary],
        query: &SearchQuery,
    ) -> Result<String> {
        let all_tags = search::collect_tags(posts);
        let tag_links: Vec<TagLink> = all_tags
            .iter()
            .map(|tag| {
                let toggled = search::toggle_tag(&query.tags, tag);
                TagLink {
                    name: tag.clone(),
                    selected: query.tags.contains(tag),
                    href: index_url(&query.text, search::tag_param(&toggled).as_deref()),
                }
            })
            .collect();

        // Non-matching cards are rendered hidden
        let visible_count = search::filter_posts(posts, query).len();
        let cards: Vec<PostCard> = posts
            .iter()
            .map(|post| PostCard::new(post, query.matches(post)))
            .collect();

        let meta = SocialMeta::for_site(config);
        let mut context = self.base_context(config, &meta);
        context.insert("posts", &cards);
        context.insert("tags", &tag_links);
        context.insert("query", &query.text);
        context.insert(
            "tag_param",
            &search::tag_param(&query.tags).unwrap_or_default(),
        );
        context.insert("visible_count", &visible_count);
        context.insert("empty_message", query.empty_message());
        context.insert("no_posts_message", search::NO_POSTS_MESSAGE);
        context.insert("no_matches_message", search::NO_MATCHES_MESSAGE);

        self.render("index.html", &context)
    }

    /// Article page with its social metadata
    pub fn render_post(&self, config: &SiteConfig, post: &BlogPost) -> Result<String> {
        let meta = SocialMeta::for_post(post, config);
        let mut context = self.base_context(config, &meta);
        context.insert("post", &PostPage::from(post));

        self.render("post.html", &context)
    }

    /// "Not found" page
    pub fn render_not_found(&self, config: &SiteConfig) -> Result<String> {
        let mut meta = SocialMeta::for_site(config);
        meta.page_title = format!("Not Found | {}", config.title);
        let context = self.base_context(config, &meta);

        self.render("not_found.html", &context)
    }

    fn base_context(&self, config: &SiteConfig, meta: &SocialMeta) -> Context {
        let mut context = Context::new();
        context.insert("config", &ConfigData::from(config));
        context.insert("meta", meta);
        context.insert("meta_tags", &meta.render_tags());
        context.insert("current_year", &Utc::now().year());
        context
    }
}

/// Tera filter: format an ISO 8601 date string
///
/// `format="long"` gives "March 2024", `format="short"` gives "Mar 5, 2024".
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "short".to_string(),
    };

    let Ok(date) = DateTime::parse_from_rfc3339(&s) else {
        // Leave unparseable input untouched
        return Ok(tera::Value::String(s));
    };

    let formatted = match format.as_str() {
        "long" => month_year(&date),
        "short" => short_date(&date),
        other => {
            let items: Vec<Item> = StrftimeItems::new(other).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return Err(tera::Error::msg(format!(
                    "date_format: invalid format {:?}",
                    other
                )));
            }
            date.format_with_items(items.into_iter()).to_string()
        }
    };
    Ok(tera::Value::String(formatted))
}

// Template context data

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub math: bool,
    pub mermaid: bool,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            url: config.base_url().to_string(),
            math: config.math,
            mermaid: config.mermaid,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub date: String,
    pub path: String,
    pub author: String,
    pub tags: Vec<String>,
    /// Passes the current search; hidden otherwise
    pub visible: bool,
}

impl PostCard {
    fn new(post: &PostSummary, visible: bool) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            date: date_iso(&post.date),
            path: post.path(),
            author: post.author.clone(),
            tags: post.tags.clone(),
            visible,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub title: String,
    pub subtitle: Option<String>,
    pub date: String,
    pub author: String,
    pub twitter: String,
    pub tags: Vec<String>,
    pub content: String,
}

impl From<&BlogPost> for PostPage {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            date: date_iso(&post.date),
            author: post.author.clone(),
            twitter: post.twitter.clone(),
            tags: post.tags.clone(),
            content: post.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub selected: bool,
    /// Index URL with this tag toggled
    pub href: String,
}
