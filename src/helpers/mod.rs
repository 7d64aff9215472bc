//! Helper functions for rendering
//!
//! Localized dates, URL building and small HTML utilities shared by the
//! generator, the preview server and the CLI.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
