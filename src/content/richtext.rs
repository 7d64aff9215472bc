//! Structured rich text and its conversion to HTML

use serde::{Deserialize, Serialize};

use crate::helpers::html_escape;

/// An ordered sequence of structured text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

/// A single rich-text block, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub oembed: Oembed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub embed_url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Inline formatting over the char range `start..end` of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<SpanData>,
}

/// Payload of `hyperlink` and `label` spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Linked document uid, for `link_type: Document`
    #[serde(default)]
    pub uid: Option<String>,
    /// Linked document type, for `link_type: Document`
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Maps a link span to an href
pub trait LinkResolver {
    fn resolve(&self, link: &SpanData) -> Option<String>;
}

/// Resolves only web and media links, which carry their own URL
pub struct UrlOnly;

impl LinkResolver for UrlOnly {
    fn resolve(&self, link: &SpanData) -> Option<String> {
        link.url.clone()
    }
}

impl<F> LinkResolver for F
where
    F: Fn(&SpanData) -> Option<String>,
{
    fn resolve(&self, link: &SpanData) -> Option<String> {
        self(link)
    }
}

impl RichText {
    /// Text of all blocks, one block per line
    pub fn plain_text(&self) -> String {
        self.0
            .iter()
            .filter_map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Block {
    fn text(&self) -> Option<&str> {
        match self {
            Block::Paragraph(b)
            | Block::Heading1(b)
            | Block::Heading2(b)
            | Block::Heading3(b)
            | Block::Heading4(b)
            | Block::Heading5(b)
            | Block::Heading6(b)
            | Block::Preformatted(b)
            | Block::ListItem(b)
            | Block::OrderedListItem(b) => Some(&b.text),
            _ => None,
        }
    }
}

/// Convert rich text to HTML
///
/// Text is escaped; the returned markup is meant to be inserted unescaped.
/// Consecutive list items are grouped into a single list element.
pub fn as_html(rich_text: &RichText, resolver: &dyn LinkResolver) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in &rich_text.0 {
        let list_tag = match block {
            Block::ListItem(_) => Some("ul"),
            Block::OrderedListItem(_) => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        match block {
            Block::Paragraph(b) => wrap(&mut out, "p", b, resolver),
            Block::Heading1(b) => wrap(&mut out, "h1", b, resolver),
            Block::Heading2(b) => wrap(&mut out, "h2", b, resolver),
            Block::Heading3(b) => wrap(&mut out, "h3", b, resolver),
            Block::Heading4(b) => wrap(&mut out, "h4", b, resolver),
            Block::Heading5(b) => wrap(&mut out, "h5", b, resolver),
            Block::Heading6(b) => wrap(&mut out, "h6", b, resolver),
            Block::Preformatted(b) => wrap(&mut out, "pre", b, resolver),
            Block::ListItem(b) | Block::OrderedListItem(b) => wrap(&mut out, "li", b, resolver),
            Block::Image(img) => {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}"{} /></p>"#,
                    html_escape(&img.url),
                    html_escape(img.alt.as_deref().unwrap_or("")),
                    img.copyright
                        .as_deref()
                        .map(|c| format!(r#" copyright="{}""#, html_escape(c)))
                        .unwrap_or_default()
                ));
            }
            Block::Embed(embed) => {
                let o = &embed.oembed;
                out.push_str(&format!(
                    r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                    html_escape(&o.embed_url),
                    html_escape(&o.kind),
                    html_escape(o.provider_name.as_deref().unwrap_or("")),
                    o.html.as_deref().unwrap_or("")
                ));
            }
            Block::Unsupported => {
                tracing::debug!("Skipping unsupported rich text block");
            }
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }

    out
}

fn wrap(out: &mut String, tag: &str, block: &TextBlock, resolver: &dyn LinkResolver) {
    out.push_str(&format!("<{}>", tag));
    out.push_str(&render_spans(block, resolver));
    out.push_str(&format!("</{}>", tag));
}

/// Render a block's text with its spans applied
///
/// Spans that cross each other are split so the output stays well nested.
fn render_spans(block: &TextBlock, resolver: &dyn LinkResolver) -> String {
    let chars: Vec<char> = block.text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<(usize, usize, &Span)> = block
        .spans
        .iter()
        .map(|s| (s.start.min(len), s.end.min(len), s))
        .filter(|(start, end, _)| start < end)
        .collect();
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut out = String::with_capacity(block.text.len());
    let mut stack: Vec<(usize, &Span)> = Vec::new();
    let mut next = 0;

    for pos in 0..=len {
        if let Some(lowest) = stack.iter().position(|(end, _)| *end <= pos) {
            let popped: Vec<(usize, &Span)> = stack.drain(lowest..).collect();
            for (_, span) in popped.iter().rev() {
                out.push_str(&close_tag(span));
            }
            for (end, span) in popped.into_iter().filter(|(end, _)| *end > pos) {
                out.push_str(&open_tag(span, resolver));
                stack.push((end, span));
            }
        }

        while next < spans.len() && spans[next].0 == pos {
            let (_, end, span) = spans[next];
            out.push_str(&open_tag(span, resolver));
            stack.push((end, span));
            next += 1;
        }

        if pos < len {
            match chars[pos] {
                '\n' => out.push_str("<br />"),
                c => out.push_str(&html_escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
    }

    out
}

fn open_tag(span: &Span, resolver: &dyn LinkResolver) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let data = span.data.clone().unwrap_or_default();
            let href = resolver.resolve(&data).unwrap_or_default();
            let target = data
                .target
                .as_deref()
                .map(|t| format!(r#" target="{}" rel="noopener""#, html_escape(t)))
                .unwrap_or_default();
            format!(r#"<a href="{}"{}>"#, html_escape(&href), target)
        }
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        _ => String::new(),
    }
}

fn close_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        "label" => "</span>",
        _ => "",
    }
    .to_string()
}
