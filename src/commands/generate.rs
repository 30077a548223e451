//! Generate static files

use anyhow::{Context, Result};

use crate::cms::ContentApi;
use crate::generator::Generator;
use crate::Blog;

/// Generate the static site from the configured CMS repository
pub async fn run(blog: &Blog) -> Result<()> {
    let client = blog.client()?;
    tracing::info!("Fetching posts from {}", client.config().api_endpoint);
    run_with(blog, &client).await
}

/// Generate the static site from any content source
pub async fn run_with(blog: &Blog, api: &dyn ContentApi) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let summary = generator
        .generate(api)
        .await
        .context("Failed to generate site")?;

    tracing::info!(
        "Generated {} posts, {} list fragments in {:.2?}",
        summary.posts,
        summary.fragments,
        start.elapsed()
    );

    Ok(())
}
