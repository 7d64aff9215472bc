//! Content API client
//!
//! `ContentClient` is the read-only contract the generator, the pagination
//! state and the preview server consume. `PrismicClient` implements it over
//! the Prismic REST API.

mod prismic;

use std::future::Future;

use thiserror::Error;

use crate::content::{DecodeError, RawDocument, RawPage};

pub use prismic::PrismicClient;

/// Errors raised while talking to the Content API
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{doc_type} document not found: {id}")]
    NotFound { doc_type: String, id: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status code: {status}, url: {url}, response: {body}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no master ref in API response")]
    MissingMasterRef,

    #[error("api.endpoint is not configured")]
    MissingEndpoint,
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

/// Read-only queries against the Content API
pub trait ContentClient {
    /// First page of documents of a type
    fn list_by_type(
        &self,
        doc_type: &str,
        page_size: usize,
    ) -> impl Future<Output = Result<RawPage, ClientError>> + Send;

    /// A single document by its unique identifier
    fn get_by_unique_id(
        &self,
        doc_type: &str,
        id: &str,
    ) -> impl Future<Output = Result<RawDocument, ClientError>> + Send;

    /// Every unique identifier of a type, across all pages
    fn list_all_ids_by_type(
        &self,
        doc_type: &str,
    ) -> impl Future<Output = Result<Vec<String>, ClientError>> + Send;

    /// Fetch an opaque pagination URL exactly as the API returned it
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<RawPage, ClientError>> + Send;
}

#[cfg(test)]
pub mod fake {
    //! In-memory client for tests

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeClient {
        pub first_page: Option<RawPage>,
        pub pages: HashMap<String, RawPage>,
        pub documents: Vec<RawDocument>,
        /// Ids to enumerate instead of the uids of `documents`
        pub ids: Option<Vec<String>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeClient {
        pub fn with_first_page(page: RawPage) -> Self {
            Self {
                first_page: Some(page),
                ..Default::default()
            }
        }

        pub fn page(mut self, url: &str, page: RawPage) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }

        pub fn document(mut self, doc: RawDocument) -> Self {
            self.documents.push(doc);
            self
        }

        pub fn ids(mut self, ids: &[&str]) -> Self {
            self.ids = Some(ids.iter().map(|id| id.to_string()).collect());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn log(&self, request: String) {
            self.requests.lock().unwrap().push(request);
        }
    }

    impl ContentClient for FakeClient {
        async fn list_by_type(&self, doc_type: &str, page_size: usize) -> Result<RawPage, ClientError> {
            self.log(format!("list:{}:{}", doc_type, page_size));
            self.first_page.clone().ok_or(ClientError::MissingEndpoint)
        }

        async fn get_by_unique_id(&self, doc_type: &str, id: &str) -> Result<RawDocument, ClientError> {
            self.log(format!("get:{}:{}", doc_type, id));
            self.documents
                .iter()
                .find(|d| d.uid.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| ClientError::NotFound {
                    doc_type: doc_type.to_string(),
                    id: id.to_string(),
                })
        }

        async fn list_all_ids_by_type(&self, doc_type: &str) -> Result<Vec<String>, ClientError> {
            self.log(format!("ids:{}", doc_type));
            match &self.ids {
                Some(ids) => Ok(ids.clone()),
                None => Ok(self.documents.iter().filter_map(|d| d.uid.clone()).collect()),
            }
        }

        async fn fetch_page(&self, url: &str) -> Result<RawPage, ClientError> {
            self.log(format!("fetch:{}", url));
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ClientError::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                    url: url.to_string(),
                    body: String::new(),
                })
        }
    }

    /// A listing document with the given uid
    pub fn summary_doc(uid: &str, date: &str) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "posts",
            "first_publication_date": date,
            "data": {
                "title": format!("Title {}", uid),
                "subtitle": format!("Subtitle {}", uid),
                "author": "Joseph Oliveira",
            }
        }))
        .unwrap()
    }

    /// A full post document with two sections
    pub fn detail_doc(uid: &str) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "posts",
            "first_publication_date": "2021-03-25T19:25:28+0000",
            "data": {
                "title": format!("Title {}", uid),
                "subtitle": "Subtitle",
                "author": "Danilo Vieira",
                "banner": { "url": "https://images.prismic.io/banner.png" },
                "content": [
                    {
                        "heading": "First heading",
                        "body": [{ "type": "paragraph", "text": "First body", "spans": [] }]
                    },
                    {
                        "heading": "Second heading",
                        "body": [{ "type": "paragraph", "text": "Second body", "spans": [] }]
                    }
                ]
            }
        }))
        .unwrap()
    }

    pub fn raw_page(page: usize, next_page: Option<&str>, results: Vec<RawDocument>) -> RawPage {
        RawPage {
            page,
            next_page: next_page.map(str::to_string),
            results,
        }
    }
}
