//! Errors raised while reading, parsing and rendering content

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading posts
#[derive(Debug, Error)]
pub enum ContentError {
    /// No readable store item exists for the slug
    #[error("post not found: {slug}")]
    NotFound { slug: String },

    /// The slug would resolve outside the content directory
    #[error("invalid slug: {slug:?}")]
    InvalidSlug { slug: String },

    /// The front-matter block is malformed
    #[error("failed to parse front-matter of {slug}: {reason}")]
    Parse { slug: String, reason: String },

    /// Markdown conversion failed
    #[error("failed to render {slug}: {reason}")]
    Render { slug: String, reason: String },

    /// The content directory itself could not be enumerated
    #[error("content store unavailable at {path:?}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Whether the presentation layer should answer "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidSlug { .. })
    }
}

/// Result alias for content operations
pub type Result<T> = std::result::Result<T, ContentError>;
