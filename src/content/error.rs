//! Errors raised while loading content

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a post for a slug
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl ContentError {
    /// Whether the handler should answer "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidSlug(_))
    }
}
