//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/logo.svg") // -> "/blog/logo.svg"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        return path.to_string();
    }

    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Encode a document identifier for use as one path segment
pub fn encode_segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

/// Link target of a post detail page
///
/// # Examples
/// ```ignore
/// post_url(&config, "como-utilizar-hooks") // -> "/post/como-utilizar-hooks/"
/// ```
pub fn post_url(config: &SiteConfig, id: &str) -> String {
    url_for(
        config,
        &format!("{}/{}/", config.post_dir.trim_matches('/'), encode_segment(id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        config.root = "/blog/".to_string();
        config
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/logo.svg"), "/blog/logo.svg");
        assert_eq!(url_for(&config, ""), "/blog/");
        assert_eq!(
            url_for(&config, "https://images.prismic.io/a.png"),
            "https://images.prismic.io/a.png"
        );
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/post/a/"),
            "https://example.com/blog/post/a/"
        );
    }

    #[test]
    fn test_post_url() {
        let config = SiteConfig::default();
        assert_eq!(post_url(&config, "criando-um-app"), "/post/criando-um-app/");
        assert_eq!(post_url(&config, "a b/c"), "/post/a%20b%2Fc/");
    }
}
