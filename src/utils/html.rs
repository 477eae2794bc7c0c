//! HTML cleanup for search API snippets.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Unescape the handful of entities the search API emits.
pub fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Remove markup (the API wraps query terms in `<b>`) and decode entities.
pub fn strip_tags(s: &str) -> String {
    html_unescape(&TAG_RE.replace_all(s, ""))
}
