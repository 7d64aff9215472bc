//! Generate static files

use anyhow::Result;

use crate::client::ContentClient;
use crate::generator::{GenerateSummary, Generator};
use crate::Blog;

/// Generate the static site from the configured Content API
pub async fn run(blog: &Blog) -> Result<()> {
    let client = blog.client()?;
    run_with_client(blog, client).await?;
    Ok(())
}

/// Generate with an explicit client
pub async fn run_with_client<C: ContentClient>(blog: &Blog, client: C) -> Result<GenerateSummary> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, client)?;
    let summary = generator.generate().await?;

    tracing::info!(
        "Listed {} posts on the home page, rendered {} post pages",
        summary.listed,
        summary.posts_written
    );
    if !summary.missing.is_empty() {
        tracing::warn!(
            "{} posts could not be fetched: {}",
            summary.missing.len(),
            summary.missing.join(", ")
        );
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(summary)
}
