//! List posts the way the home page pages through them

use anyhow::Result;

use crate::client::ContentClient;
use crate::helpers::DateFormatter;
use crate::pagination::{LoadOutcome, PostList};
use crate::Blog;

/// Print the home page listing, loading more pages while the button would show
pub async fn run(blog: &Blog, max_pages: Option<usize>) -> Result<()> {
    let client = blog.client()?;
    let list = walk(blog, &client, max_pages).await?;
    let dates = DateFormatter::new(&blog.config)?;

    println!("Posts ({}):", list.items().len());
    for line in format_lines(&list, &dates) {
        println!("  {}", line);
    }
    if list.button_visible() {
        println!("  ... more posts available");
    }

    Ok(())
}

/// Initialize the listing and press "load more" until it hides or `max_pages` is reached
pub async fn walk<C: ContentClient>(
    blog: &Blog,
    client: &C,
    max_pages: Option<usize>,
) -> Result<PostList> {
    let api = &blog.config.api;
    let mut list = PostList::initialize(client, &api.document_type, api.page_size).await?;
    let mut pages = 1;

    while list.button_visible() && max_pages.map_or(true, |max| pages < max) {
        match list.load_more(client).await? {
            LoadOutcome::Appended(count) => {
                pages += 1;
                tracing::debug!("Page {}: {} posts", pages, count);
            }
            LoadOutcome::Skipped => break,
        }
    }

    Ok(list)
}

/// One display line per post
pub fn format_lines(list: &PostList, dates: &DateFormatter) -> Vec<String> {
    list.items()
        .iter()
        .map(|post| {
            format!(
                "{} - {} [{}] by {}",
                dates.format_opt(post.published_at.as_ref()),
                post.title,
                post.id,
                post.author
            )
        })
        .collect()
}
