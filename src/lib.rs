//! spacetraveling: a blog front-end generated from a Prismic repository
//!
//! Posts are fetched from the CMS, rendered with embedded Tera templates
//! and written out as a static site. The bundled server adds editorial
//! preview, live load-more batches and on-demand generation of posts
//! published after the last build.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pagination;
pub mod preview;
pub mod server;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// CMS connection settings
    pub cms: config::CmsConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a blog from a directory, reading CMS settings from the environment
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::with_cms(base_dir, config::CmsConfig::from_env())
    }

    /// Create a blog from a directory with explicit CMS settings
    pub fn with_cms<P: AsRef<Path>>(base_dir: P, cms: config::CmsConfig) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            cms,
            base_dir,
            public_dir,
        })
    }

    /// HTTP client for the configured repository
    pub fn client(&self) -> Result<cms::PrismicClient> {
        Ok(cms::PrismicClient::new(self.cms.clone())?)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
