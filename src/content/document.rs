//! Raw documents as returned by the Content API
//!
//! The API gives no schema guarantee, so documents are kept as loose JSON
//! here and decoded into typed posts in `post.rs`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoding failure at the API boundary
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("document {document}: missing or invalid field `{field}`")]
    MissingField { document: String, field: String },

    #[error("document {document}: invalid timestamp {value:?}")]
    InvalidTimestamp { document: String, value: String },

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document as delivered by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawDocument {
    /// Identifier used in detail URLs; falls back to the API id for error messages
    pub fn label(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }

    /// The unique identifier, required for anything that links to the post
    pub fn require_uid(&self) -> Result<String, DecodeError> {
        self.uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| self.missing("uid"))
    }

    /// Look up a field under `data`
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.get(name).filter(|v| !v.is_null())
    }

    /// A text field; rich-text titles are flattened to their plain text
    pub fn text_field(&self, name: &str) -> Result<String, DecodeError> {
        match self.field(name) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(serde_json::Value::Array(blocks)) => Ok(blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join(" ")),
            _ => Err(self.missing(name)),
        }
    }

    /// Parse `first_publication_date`; `null` means never published
    pub fn published_at(&self) -> Result<Option<DateTime<FixedOffset>>, DecodeError> {
        match &self.first_publication_date {
            None => Ok(None),
            Some(value) => parse_timestamp(value)
                .map(Some)
                .ok_or_else(|| DecodeError::InvalidTimestamp {
                    document: self.label().to_string(),
                    value: value.clone(),
                }),
        }
    }

    pub fn missing(&self, field: &str) -> DecodeError {
        DecodeError::MissingField {
            document: self.label().to_string(),
            field: field.to_string(),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

fn first_page() -> usize {
    1
}

/// Parse an API timestamp
///
/// Accepts RFC 3339 and the `+0000` offset form the API emits.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}
