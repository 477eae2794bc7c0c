//! Supported blog platforms and URL handling.

use url::Url;

/// Blog service a post URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Frameset-based primary platform (outer shell + `mainFrame`).
    Primary,
    /// Secondary platform; single document, generic selectors.
    Secondary,
}

/// Host rules for platform detection.
#[derive(Debug, Clone)]
pub struct PlatformHosts {
    /// Host prefixes of the primary platform.
    pub primary_prefixes: Vec<String>,
    /// Host suffix of the secondary platform.
    pub secondary_suffix: String,
    /// Base for bare relative frame sources.
    pub primary_base_url: String,
}

impl Default for PlatformHosts {
    fn default() -> Self {
        Self {
            primary_prefixes: vec!["blog.naver.com".to_string(), "m.blog.naver.com".to_string()],
            secondary_suffix: "tistory.com".to_string(),
            primary_base_url: "https://blog.naver.com/".to_string(),
        }
    }
}

impl PlatformHosts {
    pub fn detect(&self, url: &Url) -> Option<Platform> {
        let host = url.host_str()?.to_ascii_lowercase();
        if self
            .primary_prefixes
            .iter()
            .any(|prefix| host.starts_with(prefix.as_str()))
        {
            Some(Platform::Primary)
        } else if host == self.secondary_suffix
            || host.ends_with(&format!(".{}", self.secondary_suffix))
        {
            Some(Platform::Secondary)
        } else {
            None
        }
    }
}

/// Prepend `https://` when the scheme is missing.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", trimmed)
    }
}

/// Resolve an inner frame `src` against the page it was found on.
///
/// Rooted sources (`/x`, `//host/x`) and absolute URLs resolve against the
/// outer page; bare relative sources, `./` and `../` included, resolve
/// against the platform base URL.
pub fn resolve_frame_src(
    page_url: &Url,
    src: &str,
    base_url: &str,
) -> Result<String, url::ParseError> {
    let src = src.trim();
    let resolved = if src.starts_with('/') || Url::parse(src).is_ok() {
        page_url.join(src)?
    } else {
        Url::parse(base_url)?.join(src)?
    };
    Ok(resolved.to_string())
}
