//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::helpers::DateLocale;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,

    // Directory
    pub public_dir: String,

    // List page
    pub page_size: usize,

    // Detail pages
    pub fallback: bool,
    pub words_per_minute: usize,

    #[serde(default)]
    pub comments: CommentsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),

            public_dir: "public".to_string(),

            page_size: 2,

            fallback: true,
            words_per_minute: 200,

            comments: CommentsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Locale used for every displayed date
    pub fn date_locale(&self) -> DateLocale {
        DateLocale::from_language(&self.language)
    }
}

/// utterances comments widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// GitHub repository backing the comments ("owner/name"); empty disables the widget
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub label: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
            label: String::new(),
        }
    }
}

impl CommentsConfig {
    pub fn enabled(&self) -> bool {
        !self.repo.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.page_size, 2);
        assert_eq!(config.language, "pt-BR");
        assert!(config.fallback);
        assert!(!config.comments.enabled());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
page_size: 5
comments:
  repo: someone/blog-comments
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.date_locale(), DateLocale::En);
        assert!(config.comments.enabled());
        assert_eq!(config.comments.issue_term, "pathname");
        assert_eq!(config.public_dir, "public");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SiteConfig::load(dir.path().join("_config.yml")).is_err());
    }
}
