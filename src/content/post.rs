//! Post models decoded from raw documents

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::document::{DecodeError, RawDocument};
use super::richtext::RichText;

/// A post as shown on the home page listing
///
/// The raw publication timestamp is kept; it is only formatted when
/// list items are built for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post for the detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub published_at: Option<DateTime<FixedOffset>>,
    pub id: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub sections: Vec<Section>,
}

/// One heading plus its rich-text body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: RichText,
}

impl TryFrom<&RawDocument> for PostSummary {
    type Error = DecodeError;

    fn try_from(doc: &RawDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: doc.require_uid()?,
            published_at: doc.published_at()?,
            title: doc.text_field("title")?,
            subtitle: doc.text_field("subtitle")?,
            author: doc.text_field("author")?,
        })
    }
}

impl TryFrom<&RawDocument> for PostDetail {
    type Error = DecodeError;

    fn try_from(doc: &RawDocument) -> Result<Self, Self::Error> {
        let banner_url = doc
            .field("banner")
            .and_then(|b| b.get("url"))
            .and_then(|u| u.as_str())
            .ok_or_else(|| doc.missing("banner.url"))?
            .to_string();

        let sections = doc
            .field("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| doc.missing("content"))?
            .iter()
            .enumerate()
            .map(|(i, section)| decode_section(doc, i, section))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            published_at: doc.published_at()?,
            id: doc.require_uid()?,
            title: doc.text_field("title")?,
            banner_url,
            author: doc.text_field("author")?,
            sections,
        })
    }
}

fn decode_section(
    doc: &RawDocument,
    index: usize,
    section: &serde_json::Value,
) -> Result<Section, DecodeError> {
    let heading = section
        .get("heading")
        .and_then(|h| h.as_str())
        .ok_or_else(|| doc.missing(&format!("content[{}].heading", index)))?
        .to_string();

    let body = section
        .get("body")
        .filter(|b| b.is_array())
        .ok_or_else(|| doc.missing(&format!("content[{}].body", index)))?;
    let body: RichText = serde_json::from_value(body.clone())?;

    Ok(Section { heading, body })
}

impl PostDetail {
    /// Plain text of every heading and body, for word counts
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("{}\n{}", s.heading, s.body.plain_text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
