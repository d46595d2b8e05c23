//! Post loader - loads a single post from the content store

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::error::{ContentError, Result};
use super::store::{is_plain_file_name, ContentStore};
use super::{FrontMatter, MarkdownRenderer, Post};

/// Loads posts by slug; holds no mutable state and is safe to share
pub struct PostLoader {
    store: Arc<dyn ContentStore>,
    renderer: MarkdownRenderer,
}

impl PostLoader {
    /// Create a new post loader
    pub fn new(store: Arc<dyn ContentStore>, renderer: MarkdownRenderer) -> Self {
        Self { store, renderer }
    }

    /// The store posts are read from
    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// Load, parse and render the post stored as `<slug>.md`
    pub fn load_by_slug(&self, slug: &str) -> Result<Post> {
        if !is_plain_file_name(slug) {
            return Err(ContentError::InvalidSlug {
                slug: slug.to_string(),
            });
        }

        let file_name = format!("{}.md", slug);
        let raw = self.store.read(&file_name).map_err(|e| {
            tracing::debug!("Could not read {}: {}", file_name, e);
            ContentError::NotFound {
                slug: slug.to_string(),
            }
        })?;

        let parse_error = |reason: String| ContentError::Parse {
            slug: slug.to_string(),
            reason,
        };
        let (fm, body) = FrontMatter::parse(&raw).map_err(|e| parse_error(e.to_string()))?;
        let date = fm.parse_date().map_err(|e| parse_error(e.to_string()))?;

        let content = self.renderer.render(body).map_err(|e| ContentError::Render {
            slug: slug.to_string(),
            reason: e.to_string(),
        })?;

        // Undated posts fall back to the file's modification time
        let date = date
            .or_else(|| self.store.modified(&file_name).map(DateTime::<Utc>::from))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        // The slug always comes from the file name, never from front-matter
        let title = fm
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| slug.to_string());

        Ok(Post::new(title, date, slug.to_string(), content))
    }
}
