//! Content module - documents from the Content API and their typed forms

pub mod document;
pub mod post;
pub mod richtext;

pub use document::{DecodeError, RawDocument, RawPage};
pub use post::{PostDetail, PostSummary, Section};
pub use richtext::RichText;
