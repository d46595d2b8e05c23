//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cache::{DEFAULT_RESERVED_SLUGS, DEFAULT_TTL};

/// Environment variable naming the region the server runs in
pub const REGION_ENV: &str = "FLY_REGION";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,

    // Directory
    pub content_dir: String,
    pub assets_dir: String,

    // Server
    pub ip: String,
    pub port: u16,
    pub force_https: bool,
    pub region: Option<String>,

    // Content cache
    /// Freshness window of the post listing, in seconds
    pub cache_ttl: u64,
    pub reserved_slugs: Vec<String>,

    // Writing
    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Folio".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),

            content_dir: "content".to_string(),
            assets_dir: "assets".to_string(),

            ip: "0.0.0.0".to_string(),
            port: 8080,
            force_https: true,
            region: None,

            cache_ttl: DEFAULT_TTL.as_secs(),
            reserved_slugs: DEFAULT_RESERVED_SLUGS.map(String::from).to_vec(),

            highlight: HighlightConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Freshness window of the post listing
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Region shown in page footers: `FLY_REGION`, then config, then "localhost"
    pub fn region(&self) -> String {
        std::env::var(REGION_ENV)
            .ok()
            .filter(|r| !r.is_empty())
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| "localhost".to_string())
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.reserved_slugs, vec!["about", "index"]);
        assert!(config.force_https);
        assert!(config.highlight.enable);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
title: My Blog
port: 3000
cache_ttl: 60
highlight:
  line_number: false
"#;
        let config = SiteConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.content_dir, "content");
        assert!(!config.highlight.line_number);
        assert_eq!(config.highlight.theme, "base16-ocean.dark");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = SiteConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.title, "Folio");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(SiteConfig::from_yaml("port: not-a-number").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "author: Jane\nreserved_slugs: [about]\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.author, "Jane");
        assert_eq!(config.reserved_slugs, vec!["about"]);
        assert!(SiteConfig::load(dir.path().join("missing.yml")).is_err());
    }
}
