//! Home page listing state and "load more" pagination
//!
//! `PostList` is initialized from the first page at build time and only
//! ever grows by appending the next page's results. The API's next-page URL
//! is stored and re-fetched verbatim, never parsed.

use serde::{Deserialize, Serialize};

use crate::client::{ClientError, ContentClient};
use crate::content::{DecodeError, PostSummary, RawPage};

/// Where the next page lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub next_page_url: Option<String>,
    pub current_page_index: usize,
}

/// Result of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many posts were appended
    Appended(usize),
    /// The guard rejected the call; nothing was fetched
    Skipped,
}

/// Listing state: posts in display order plus the pagination cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    items: Vec<PostSummary>,
    cursor: Cursor,
}

impl PostList {
    /// Build the initial state from the first page of results
    pub fn from_first_page(page: &RawPage) -> Result<Self, DecodeError> {
        Ok(Self {
            items: decode_summaries(page)?,
            cursor: Cursor {
                next_page_url: page.next_page.clone(),
                current_page_index: 1,
            },
        })
    }

    /// Query the first page and build the initial state
    pub async fn initialize<C: ContentClient>(
        client: &C,
        doc_type: &str,
        page_size: usize,
    ) -> Result<Self, ClientError> {
        let page = client.list_by_type(doc_type, page_size).await?;
        let list = Self::from_first_page(&page)?;
        tracing::debug!(
            "Initialized post list with {} posts (next page: {:?})",
            list.items.len(),
            list.cursor.next_page_url
        );
        Ok(list)
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.items
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Whether a `load_more` call would issue a request
    ///
    /// Only a page index past the first combined with an absent next page
    /// blocks the request; on the first page a fetch is always attempted.
    /// `load-more.js` checks the same condition in the browser and adds an
    /// in-flight flag in place of the exclusive borrow; keep them in sync.
    pub fn can_load_more(&self) -> bool {
        !(self.cursor.current_page_index != 1 && self.cursor.next_page_url.is_none())
    }

    /// Whether the "load more" control is shown
    ///
    /// Derived from the cursor alone: hidden as soon as the API reports no
    /// next page. Nothing ever sets the cursor back to a page once it is gone.
    pub fn button_visible(&self) -> bool {
        self.cursor.next_page_url.is_some()
    }

    /// Fetch the next page and append its posts
    ///
    /// The exclusive borrow keeps at most one fetch in flight per list. On
    /// error the state is left exactly as it was; there is no retry.
    pub async fn load_more<C: ContentClient>(
        &mut self,
        client: &C,
    ) -> Result<LoadOutcome, ClientError> {
        if !self.can_load_more() {
            tracing::debug!("No next page, skipping load more");
            return Ok(LoadOutcome::Skipped);
        }

        let url = self.cursor.next_page_url.as_deref().unwrap_or_default();
        let page = client.fetch_page(url).await?;
        let mut posts = decode_summaries(&page)?;
        let appended = posts.len();

        self.items.append(&mut posts);
        self.cursor = Cursor {
            next_page_url: page.next_page,
            current_page_index: page.page,
        };
        tracing::debug!(
            "Loaded page {} ({} posts, {} total)",
            self.cursor.current_page_index,
            appended,
            self.items.len()
        );

        Ok(LoadOutcome::Appended(appended))
    }
}

fn decode_summaries(page: &RawPage) -> Result<Vec<PostSummary>, DecodeError> {
    page.results.iter().map(PostSummary::try_from).collect()
}
