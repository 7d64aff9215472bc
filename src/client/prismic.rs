//! Prismic REST API (v2) client

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{ClientError, ContentClient};
use crate::config::ApiConfig;
use crate::content::{RawDocument, RawPage};

/// Page size used when walking every document of a type
const ALL_PAGE_SIZE: usize = 100;

/// Client for a Prismic repository's document API
#[derive(Debug)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    http: reqwest::Client,
    master_ref: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(ClientError::MissingEndpoint);
        }

        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            http: builder.build()?,
            master_ref: OnceCell::new(),
        })
    }

    /// The ref documents are read at; resolved once per client
    async fn master_ref(&self) -> Result<&str, ClientError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let mut request = self.http.get(&self.endpoint);
                if let Some(token) = &self.access_token {
                    request = request.query(&[("access_token", token)]);
                }
                let info: ApiInfo = self.send_json(request).await?;
                info.refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or(ClientError::MissingMasterRef)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(&self, predicate: &str, page_size: usize) -> Result<RawPage, ClientError> {
        let reference = self.master_ref().await?;
        let page_size = page_size.to_string();

        let mut query = vec![
            ("ref", reference),
            ("q", predicate),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(token) = &self.access_token {
            query.push(("access_token", token.as_str()));
        }

        let request = self
            .http
            .get(format!("{}/documents/search", self.endpoint))
            .query(&query);
        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        tracing::debug!("GET {} -> {}", url, status);

        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url,
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.into()))
    }
}

impl ContentClient for PrismicClient {
    async fn list_by_type(&self, doc_type: &str, page_size: usize) -> Result<RawPage, ClientError> {
        self.search(&type_predicate(doc_type), page_size).await
    }

    async fn get_by_unique_id(&self, doc_type: &str, id: &str) -> Result<RawDocument, ClientError> {
        let page = self.search(&uid_predicate(doc_type, id), 1).await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound {
                doc_type: doc_type.to_string(),
                id: id.to_string(),
            })
    }

    async fn list_all_ids_by_type(&self, doc_type: &str) -> Result<Vec<String>, ClientError> {
        let mut page = self.search(&type_predicate(doc_type), ALL_PAGE_SIZE).await?;
        let mut ids = Vec::new();

        loop {
            ids.extend(page.results.into_iter().filter_map(|doc| doc.uid));
            match page.next_page {
                Some(next) => page = self.fetch_page(&next).await?,
                None => break,
            }
        }

        Ok(ids)
    }

    async fn fetch_page(&self, url: &str) -> Result<RawPage, ClientError> {
        self.send_json(self.http.get(url)).await
    }
}

fn type_predicate(doc_type: &str) -> String {
    format!(r#"[[at(document.type, "{}")]]"#, escape_quoted(doc_type))
}

fn uid_predicate(doc_type: &str, id: &str) -> String {
    format!(
        r#"[[at(my.{}.uid, "{}")]]"#,
        doc_type,
        escape_quoted(id)
    )
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_predicates() {
        assert_eq!(type_predicate("posts"), r#"[[at(document.type, "posts")]]"#);
        assert_eq!(
            uid_predicate("posts", r#"a"b"#),
            r#"[[at(my.posts.uid, "a\"b")]]"#
        );
    }

    #[test]
    fn test_new_requires_endpoint() {
        let config = ApiConfig::default();
        assert!(matches!(
            PrismicClient::new(&config),
            Err(ClientError::MissingEndpoint)
        ));
    }

    fn doc(uid: &str) -> serde_json::Value {
        json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "posts",
            "first_publication_date": "2021-03-25T19:25:28+0000",
            "data": { "title": uid, "subtitle": "s", "author": "a" }
        })
    }

    async fn api_info() -> Json<serde_json::Value> {
        Json(json!({
            "refs": [
                { "id": "preview", "ref": "preview-ref", "isMasterRef": false },
                { "id": "master", "ref": "master-ref", "isMasterRef": true }
            ]
        }))
    }

    async fn search(
        State(base): State<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if params.get("ref").map(String::as_str) != Some("master-ref") {
            return (StatusCode::BAD_REQUEST, "bad ref").into_response();
        }
        let q = params.get("q").cloned().unwrap_or_default();
        let page_size = params.get("pageSize").cloned().unwrap_or_default();

        if q.contains("my.posts.uid") {
            let results = if q.contains(r#""first""#) {
                vec![doc("first")]
            } else {
                vec![]
            };
            return Json(json!({ "page": 1, "next_page": null, "results": results }))
                .into_response();
        }

        let next = format!("{}/page2?ref=master-ref&pageSize={}", base, page_size);
        Json(json!({ "page": 1, "next_page": next, "results": [doc("first")] })).into_response()
    }

    async fn page2() -> Json<serde_json::Value> {
        Json(json!({ "page": 2, "next_page": null, "results": [doc("second")] }))
    }

    async fn spawn_api() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = Router::new()
            .route("/api/v2", get(api_info))
            .route("/api/v2/documents/search", get(search))
            .route("/page2", get(page2))
            .route("/broken", get(|| async { "not json" }))
            .route(
                "/gone",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .with_state(base.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    fn client(base: &str) -> PrismicClient {
        PrismicClient::new(&ApiConfig {
            endpoint: format!("{}/api/v2/", base),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_by_type_and_follow_next_page() {
        let base = spawn_api().await;
        let client = client(&base);

        let first = client.list_by_type("posts", 1).await.unwrap();
        assert_eq!(first.results.len(), 1);
        assert_eq!(first.results[0].uid.as_deref(), Some("first"));
        let next = first.next_page.unwrap();
        assert!(next.ends_with("/page2?ref=master-ref&pageSize=1"));

        let second = client.fetch_page(&next).await.unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(second.results[0].uid.as_deref(), Some("second"));
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_get_by_unique_id() {
        let base = spawn_api().await;
        let client = client(&base);

        let found = client.get_by_unique_id("posts", "first").await.unwrap();
        assert_eq!(found.uid.as_deref(), Some("first"));

        let missing = client.get_by_unique_id("posts", "nope").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_list_all_ids_walks_pages() {
        let base = spawn_api().await;
        let ids = client(&base).list_all_ids_by_type("posts").await.unwrap();
        assert_eq!(ids, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_error_statuses_and_bodies() {
        let base = spawn_api().await;
        let client = client(&base);

        let err = client.fetch_page(&format!("{}/gone", base)).await.unwrap_err();
        match err {
            ClientError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let err = client.fetch_page(&format!("{}/broken", base)).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));

        let err = client.fetch_page("").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
