//! Built-in templates using the Tera template engine
//!
//! Templates and static assets are embedded in the binary; rendering needs
//! nothing on disk.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Static files written next to the generated pages
pub const ASSETS: &[(&str, &str)] = &[
    ("style.css", include_str!("site/assets/style.css")),
    ("logo.svg", include_str!("site/assets/logo.svg")),
    ("load-more.js", include_str!("site/assets/load-more.js")),
];

/// Template renderer with the embedded site templates loaded
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Autoescaping would also mangle URLs and the converted rich text;
        // API text is escaped when the context structs are built
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("404.html", include_str!("site/404.html")),
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/post_item.html",
                include_str!("site/partials/post_item.html"),
            ),
        ])?;

        tera.register_filter("json_script", json_script_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: serialize a value as JSON safe to embed in a `<script>` element
fn json_script_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let json = serde_json::to_string(value)
        .map_err(|e| tera::Error::msg(format!("json_script: {}", e)))?;
    Ok(tera::Value::String(
        json.replace('<', "\\u003c")
            .replace('>', "\\u003e")
            .replace('&', "\\u0026"),
    ))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub home_url: String,
    pub logo_url: String,
    pub asset_root: String,
}

/// One entry of the home page listing
///
/// All fields are HTML-escaped and the date is already formatted.
#[derive(Debug, Clone, Serialize)]
pub struct PostItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub id: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub reading_minutes: usize,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    /// Converted rich text
    pub html: String,
}

/// State handed to the in-browser "load more" script
#[derive(Debug, Clone, Serialize)]
pub struct InitialProps<'a> {
    pub items: &'a [crate::content::PostSummary],
    pub cursor: &'a crate::pagination::Cursor,
    pub post_base: String,
    pub locale: String,
    pub timezone: String,
}
