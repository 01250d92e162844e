//! Content module - loads posts from the content directory and renders them

mod error;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use error::ContentError;
pub use frontmatter::FrontMatter;
pub use loader::ContentLoader;
pub use markdown::{process_markdown, MarkdownRenderer, ProcessedMarkdown};
pub use post::{sort_by_date_desc, BlogPost, PostSummary};
