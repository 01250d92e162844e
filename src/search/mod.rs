//! Index-page search and tag filtering
//!
//! The index lists every post; a free-text query and a set of selected tags
//! narrow it down. Both come from the query string (`?q=...&tag=a,b`).

use indexmap::IndexSet;

use crate::content::PostSummary;

/// Shown when a text query matches nothing
pub const NO_MATCHES_MESSAGE: &str = "No blogs found matching your search.";
/// Shown when there is nothing to list
pub const NO_POSTS_MESSAGE: &str = "No blogs available.";

/// What the reader asked the index for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free text, matched case-insensitively
    pub text: String,
    /// Selected tags, matched exactly
    pub tags: Vec<String>,
}

impl SearchQuery {
    /// Build a query from raw request parameters.
    ///
    /// `tag_param` is a comma-separated list; entries that do not name one
    /// of `known_tags` are dropped.
    pub fn from_params(text: Option<&str>, tag_param: Option<&str>, known_tags: &[String]) -> Self {
        Self {
            text: text.unwrap_or_default().to_string(),
            tags: tag_param
                .map(|param| parse_tag_param(param, known_tags))
                .unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tags.is_empty()
    }

    /// Whether a post passes both the text and the tag filter
    pub fn matches(&self, post: &PostSummary) -> bool {
        self.matches_text(post) && self.matches_tags(post)
    }

    fn matches_text(&self, post: &PostSummary) -> bool {
        let query = self.text.to_lowercase();
        post.title.to_lowercase().contains(&query)
            || post
                .subtitle
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&query))
            || post
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }

    fn matches_tags(&self, post: &PostSummary) -> bool {
        self.tags.is_empty() || post.tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// Message for an empty result
    pub fn empty_message(&self) -> &'static str {
        if self.text.is_empty() {
            NO_POSTS_MESSAGE
        } else {
            NO_MATCHES_MESSAGE
        }
    }
}

/// Every tag used by any post, in order of first appearance
pub fn collect_tags(posts: &[PostSummary]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|post| post.tags.iter().cloned())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Posts matching the query, order preserved
pub fn filter_posts<'a>(posts: &'a [PostSummary], query: &SearchQuery) -> Vec<&'a PostSummary> {
    posts.iter().filter(|post| query.matches(post)).collect()
}

/// Split a `tag=a, b,c` parameter, keeping known tags only
pub fn parse_tag_param(param: &str, known_tags: &[String]) -> Vec<String> {
    param
        .split(',')
        .map(str::trim)
        .filter(|tag| known_tags.iter().any(|known| known == tag))
        .map(str::to_string)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Select `tag` if it is not selected, otherwise deselect it
pub fn toggle_tag(selected: &[String], tag: &str) -> Vec<String> {
    if selected.iter().any(|t| t == tag) {
        selected.iter().filter(|t| *t != tag).cloned().collect()
    } else {
        let mut tags = selected.to_vec();
        tags.push(tag.to_string());
        tags
    }
}

/// Value for the `tag` parameter; `None` drops the parameter
pub fn tag_param(selected: &[String]) -> Option<String> {
    if selected.is_empty() {
        None
    } else {
        Some(selected.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(title: &str, subtitle: Option<&str>, tags: &[&str]) -> PostSummary {
        PostSummary {
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            slug: slug::slugify(title),
            author: "Anonymous".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample() -> Vec<PostSummary> {
        vec![
            post("Zero Knowledge Primer", Some("An intro to SNARKs"), &["ZK", "Cryptography"]),
            post("Reentrancy Bugs", None, &["Solidity", "Security"]),
            post("Audit Retrospective", Some("What we learned"), &["Security"]),
        ]
    }

    fn titles(posts: Vec<&PostSummary>) -> Vec<&str> {
        posts.into_iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_collect_tags_first_appearance() {
        assert_eq!(
            collect_tags(&sample()),
            vec!["ZK", "Cryptography", "Solidity", "Security"]
        );
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let posts = sample();
        let query = SearchQuery::default();
        assert!(query.is_empty());
        assert_eq!(filter_posts(&posts, &query).len(), 3);
    }

    #[test]
    fn test_text_search_is_case_insensitive() {
        let posts = sample();
        let query = SearchQuery {
            text: "REENTRANCY".to_string(),
            ..Default::default()
        };
        assert_eq!(titles(filter_posts(&posts, &query)), vec!["Reentrancy Bugs"]);
    }

    #[test]
    fn test_text_search_covers_subtitle_and_tags() {
        let posts = sample();
        let by_subtitle = SearchQuery {
            text: "snarks".to_string(),
            ..Default::default()
        };
        assert_eq!(
            titles(filter_posts(&posts, &by_subtitle)),
            vec!["Zero Knowledge Primer"]
        );

        let by_tag = SearchQuery {
            text: "secur".to_string(),
            ..Default::default()
        };
        assert_eq!(
            titles(filter_posts(&posts, &by_tag)),
            vec!["Reentrancy Bugs", "Audit Retrospective"]
        );
    }

    #[test]
    fn test_tag_filter_any_of() {
        let posts = sample();
        let query = SearchQuery {
            text: String::new(),
            tags: vec!["ZK".to_string(), "Solidity".to_string()],
        };
        assert_eq!(
            titles(filter_posts(&posts, &query)),
            vec!["Zero Knowledge Primer", "Reentrancy Bugs"]
        );
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let posts = sample();
        let query = SearchQuery {
            text: String::new(),
            tags: vec!["zk".to_string()],
        };
        assert!(filter_posts(&posts, &query).is_empty());
    }

    #[test]
    fn test_text_and_tags_combine() {
        let posts = sample();
        let query = SearchQuery {
            text: "audit".to_string(),
            tags: vec!["Security".to_string()],
        };
        assert_eq!(
            titles(filter_posts(&posts, &query)),
            vec!["Audit Retrospective"]
        );
    }

    #[test]
    fn test_parse_tag_param() {
        let known = collect_tags(&sample());
        assert_eq!(
            parse_tag_param(" ZK , Unknown,Security,ZK", &known),
            vec!["ZK", "Security"]
        );
        assert!(parse_tag_param("", &known).is_empty());
    }

    #[test]
    fn test_from_params() {
        let known = collect_tags(&sample());
        let query = SearchQuery::from_params(Some("bugs"), Some("Solidity,nope"), &known);
        assert_eq!(query.text, "bugs");
        assert_eq!(query.tags, vec!["Solidity"]);

        let query = SearchQuery::from_params(None, None, &known);
        assert!(query.is_empty());
    }

    #[test]
    fn test_toggle_tag_and_param() {
        let selected = toggle_tag(&[], "ZK");
        assert_eq!(selected, vec!["ZK"]);
        let selected = toggle_tag(&selected, "Security");
        assert_eq!(tag_param(&selected).as_deref(), Some("ZK,Security"));
        let selected = toggle_tag(&selected, "ZK");
        assert_eq!(selected, vec!["Security"]);
        let selected = toggle_tag(&selected, "Security");
        assert_eq!(tag_param(&selected), None);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(SearchQuery::default().empty_message(), NO_POSTS_MESSAGE);
        let query = SearchQuery {
            text: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(query.empty_message(), NO_MATCHES_MESSAGE);
    }
}
