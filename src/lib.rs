//! folio: a small blog server for Markdown posts
//!
//! Posts are Markdown files with YAML front-matter in a content directory.
//! They are rendered to HTML, kept in a time-bounded in-memory listing, and
//! served over HTTP with an embedded Tera layout.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cache::{PostCache, SystemClock};
use content::{DirStore, MarkdownRenderer, PostLoader};

/// The main application
#[derive(Debug, Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory posts are read from
    pub content_dir: PathBuf,
    /// Directory served under /assets
    pub assets_dir: PathBuf,
}

impl Folio {
    /// Create a new instance from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let assets_dir = base_dir.join(&config.assets_dir);

        Self {
            config,
            base_dir,
            content_dir,
            assets_dir,
        }
    }

    /// A loader reading posts from the content directory
    pub fn post_loader(&self) -> PostLoader {
        PostLoader::new(
            Arc::new(DirStore::new(&self.content_dir)),
            MarkdownRenderer::with_options(&self.config.highlight),
        )
    }

    /// A post cache configured from the site settings
    pub fn post_cache(&self) -> PostCache {
        PostCache::new(Arc::new(self.post_loader()), Arc::new(SystemClock))
            .with_ttl(self.config.cache_ttl())
            .with_reserved_slugs(self.config.reserved_slugs.clone())
    }
}
