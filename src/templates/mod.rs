//! Built-in blog templates using Tera template engine
//!
//! Every template is embedded in the binary. Autoescaping stays on for
//! `.html` templates, so CMS text is escaped unless a template marks a
//! value `safe` (only pre-rendered rich text is).

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::PostSummary;
use crate::helpers::post_path;

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all blog templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("fragment.html", include_str!("blog/fragment.html")),
            ("post.html", include_str!("blog/post.html")),
            ("loading.html", include_str!("blog/loading.html")),
            ("not_found.html", include_str!("blog/not_found.html")),
            ("error.html", include_str!("blog/error.html")),
            // Partials
            (
                "partials/post_list.html",
                include_str!("blog/partials/post_list.html"),
            ),
            (
                "partials/comments.html",
                include_str!("blog/partials/comments.html"),
            ),
            (
                "partials/leave_preview.html",
                include_str!("blog/partials/leave_preview.html"),
            ),
            ("partials/style.css", include_str!("blog/partials/style.css")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
        }
    }
}

/// One entry of the post list
#[derive(Debug, Clone, Serialize)]
pub struct PostEntry {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub first_publication_date: Option<String>,
}

impl From<&PostSummary> for PostEntry {
    fn from(post: &PostSummary) -> Self {
        Self {
            uid: post.uid.clone(),
            href: post_path(&post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            first_publication_date: post.first_publication_date.clone(),
        }
    }
}
