//! List posts published in the CMS

use anyhow::Result;

use crate::cms::ContentApi;
use crate::content::PostSummary;
use crate::generator::Generator;
use crate::Blog;

/// Print every published post
pub async fn run(blog: &Blog) -> Result<()> {
    let client = blog.client()?;
    let posts = collect(blog, &client).await?;

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!("{}", line(post));
    }

    Ok(())
}

/// Follow the list cursors until the CMS runs out of posts
async fn collect(blog: &Blog, api: &dyn ContentApi) -> Result<Vec<PostSummary>> {
    let generator = Generator::new(blog)?;
    let mut list = generator.first_page(api, None).await?;
    list.drain(api).await?;
    Ok(list.into_posts())
}

fn line(post: &PostSummary) -> String {
    format!(
        "  {} - {} [{}]",
        post.first_publication_date.as_deref().unwrap_or("-"),
        post.title,
        post.uid
    )
}
