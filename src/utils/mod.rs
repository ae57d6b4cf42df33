//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Collapse every whitespace run to a single space and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a potentially relative URL against a base URL.
///
/// Absolute http(s) URLs are returned as written.
pub fn resolve_url(base: &Url, href: &str) -> String {
    if is_absolute_http_url(href) {
        return href.to_string();
    }
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Whether `candidate` is a well-formed absolute http(s) URL with no embedded whitespace.
pub fn is_absolute_http_url(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
