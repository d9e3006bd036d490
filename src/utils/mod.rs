//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod naming;

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static WORK_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"workId=(C?\d+)").unwrap());

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Extract the work identifier from a link (`...?workId=28251`).
pub fn extract_work_id(link: &str) -> Option<String> {
    WORK_ID_PATTERN
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drop the query string and fragment of a URL.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "//cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_extract_work_id() {
        assert_eq!(
            extract_work_id("https://example.com/ci_pc?workId=28251"),
            Some("28251".to_string())
        );
        assert_eq!(
            extract_work_id("/animestore/ci_pc?workId=C12345&x=1"),
            Some("C12345".to_string())
        );
        assert_eq!(extract_work_id("https://example.com/detail"), None);
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("https://img.example.com/a.jpg?v=3"),
            "https://img.example.com/a.jpg"
        );
        assert_eq!(strip_query("https://img.example.com/a.png#x"), "https://img.example.com/a.png");
        assert_eq!(strip_query("plain"), "plain");
    }
}
