//! Field extraction from blog post HTML.
//!
//! Everything here is synchronous and works on an already fetched document;
//! `scraper::Html` is not `Send`, so parsing never spans an await point.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::platform::Platform;
use crate::analysis::PatternTables;
use crate::models::CrawlSnapshot;

/// Class-name tokens that mark sticker containers.
const STICKER_CLASSES: &[&str] = &[
    "se-sticker",
    "sticker",
    "_img",
    "sponsor-tag",
    "ad-tag",
    "se-module",
    "se-module-image",
    "se-image-resource",
];

const PRIMARY_CONTENT_SELECTORS: &[&str] = &[
    ".se-main-container",
    ".post_ct",
    "#viewTypeSelector",
    ".se_component_wrap",
    ".se-module-text",
    ".sect_dsc",
    ".se_card_container",
    "#postViewArea",
    ".post-content",
];

const SECONDARY_CONTENT_SELECTORS: &[&str] = &[
    ".tt_article_useless_p_margin",
    ".entry-content",
    ".article",
    "article",
];

const PARAGRAPH_SELECTORS: &[&str] = &[
    ".se-text-paragraph",
    ".se-module-text p",
    ".post_ct p",
    ".sect_dsc p",
    "p",
];

const QUOTATION_SELECTORS: &[&str] = &[".se-quotation-container", "blockquote"];

/// Paragraph texts must be longer than this many characters.
const MIN_PARAGRAPH_CHARS: usize = 5;
const RECENT_PARAGRAPHS: usize = 10;
const LEGACY_PARAGRAPHS: usize = 3;

const LOW_QUALITY_SUFFIX: &str = "w80_blur";
const HIGH_QUALITY_SUFFIX: &str = "w773";

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("static selector is valid")
}

static PRIMARY_CONTENT: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(PRIMARY_CONTENT_SELECTORS));
static SECONDARY_CONTENT: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(SECONDARY_CONTENT_SELECTORS));
static PARAGRAPHS: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(PARAGRAPH_SELECTORS));
static QUOTATIONS: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(QUOTATION_SELECTORS));
static MAIN_FRAME: LazyLock<Selector> =
    LazyLock::new(|| selector("#mainFrame, iframe[name='mainFrame']"));
static WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| selector("[class]"));
static LINKDATA: LazyLock<Selector> = LazyLock::new(|| selector("[data-linkdata]"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"background(?:-image)?\s*:[^;]*url\(\s*['"]?([^'")]+)['"]?\s*\)"#)
        .expect("valid background regex")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// The `src` of the primary platform's inner content frame.
pub fn find_main_frame(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&MAIN_FRAME)
        .filter_map(|el| el.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}

/// Build a snapshot from a post body.
///
/// Recent-era snapshots carry only first-of-each fields.
pub fn extract_snapshot(
    html: &str,
    url: &str,
    platform: Platform,
    is_recent_era: bool,
    tables: &PatternTables,
) -> CrawlSnapshot {
    let document = Html::parse_document(html);
    let content_selectors: &[Selector] = match platform {
        Platform::Primary => PRIMARY_CONTENT.as_slice(),
        Platform::Secondary => SECONDARY_CONTENT.as_slice(),
    };
    let region = content_region(&document, content_selectors);

    let mut snapshot = CrawlSnapshot::new(url);

    let stickers = sticker_urls(&document, tables);
    snapshot.first_sticker_url = stickers.first().cloned().unwrap_or_default();
    snapshot.second_sticker_url = stickers.get(1).cloned().unwrap_or_default();
    if stickers.len() >= 2 {
        snapshot.last_sticker_url = stickers.last().cloned().unwrap_or_default();
    }

    let images = content_images(region, tables);
    snapshot.first_image_url = images.first().cloned().unwrap_or_default();
    if images.len() >= 2 {
        snapshot.last_image_url = images.last().cloned().unwrap_or_default();
    }

    let texts = paragraph_texts(region);
    if is_recent_era {
        snapshot.first_paragraph = join_texts(texts.iter().take(RECENT_PARAGRAPHS));
    } else {
        snapshot.first_paragraph = join_texts(texts.iter().take(LEGACY_PARAGRAPHS));
        let skip = texts.len().saturating_sub(LEGACY_PARAGRAPHS);
        snapshot.last_paragraph = join_texts(texts.iter().skip(skip));
    }

    if is_recent_era {
        snapshot.into_recent_era()
    } else {
        snapshot
    }
}

/// The first content container that exists, or the whole document.
fn content_region<'a>(document: &'a Html, selectors: &[Selector]) -> ElementRef<'a> {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).next())
        .unwrap_or_else(|| document.root_element())
}

fn class_has_sticker_token(class: &str) -> bool {
    STICKER_CLASSES.iter().any(|token| class.contains(token))
}

/// Distinct sticker-catalog URLs in document order.
fn sticker_urls(document: &Html, tables: &PatternTables) -> Vec<String> {
    let mut found = Vec::new();
    let push = |url: Option<String>, found: &mut Vec<String>| {
        if let Some(url) = url {
            if tables.is_sticker_url(&url) && !found.contains(&url) {
                found.push(url);
            }
        }
    };

    for el in document.select(&WITH_CLASS) {
        let class = el.value().attr("class").unwrap_or_default();
        if !class_has_sticker_token(class) {
            continue;
        }
        push(image_src(el), &mut found);
        push(linkdata_src(el), &mut found);
        push(background_url(el), &mut found);
    }

    if found.is_empty() {
        for el in document.select(&LINKDATA) {
            push(parse_linkdata(el), &mut found);
        }
    }
    if found.is_empty() {
        for el in document.select(&IMG) {
            push(img_url(el), &mut found);
        }
    }
    found
}

/// `src` of the element itself when it is an image, else of its first image.
fn image_src(el: ElementRef<'_>) -> Option<String> {
    if el.value().name() == "img" {
        if let Some(url) = img_url(el) {
            return Some(url);
        }
    }
    el.select(&IMG).find_map(img_url)
}

fn linkdata_src(el: ElementRef<'_>) -> Option<String> {
    parse_linkdata(el).or_else(|| el.select(&LINKDATA).find_map(parse_linkdata))
}

/// The `src` key of a `data-linkdata` JSON blob.
fn parse_linkdata(el: ElementRef<'_>) -> Option<String> {
    let raw = el.value().attr("data-linkdata")?;
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .get("src")
        .and_then(|v| v.as_str())
        .and_then(absolute_http_url)
}

fn background_url(el: ElementRef<'_>) -> Option<String> {
    let style = el.value().attr("style")?;
    let caps = BACKGROUND_URL.captures(style)?;
    absolute_http_url(caps.get(1)?.as_str())
}

/// First usable URL among `src`, `data-src`, `data-lazy-src`.
fn img_url(el: ElementRef<'_>) -> Option<String> {
    ["src", "data-src", "data-lazy-src"]
        .iter()
        .filter_map(|attr| el.value().attr(attr))
        .find_map(absolute_http_url)
}

/// Accept http(s) and protocol-relative URLs only.
fn absolute_http_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else {
        raw.strip_prefix("//").map(|rest| format!("https://{}", rest))
    }
}

fn under_sticker(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().attr("class").is_some_and(|c| c.contains("sticker")))
}

/// Swap the blurred thumbnail rendition for the readable one.
pub fn upgrade_image_quality(url: &str) -> String {
    match url.strip_suffix(LOW_QUALITY_SUFFIX) {
        Some(prefix) => format!("{}{}", prefix, HIGH_QUALITY_SUFFIX),
        None => url.to_string(),
    }
}

/// Distinct content images inside the region, in document order.
fn content_images(region: ElementRef<'_>, tables: &PatternTables) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for img in region.select(&IMG) {
        if under_sticker(img) {
            continue;
        }
        let Some(url) = img_url(img) else { continue };
        if tables.is_sticker_url(&url) || tables.is_excluded_image(&url) {
            continue;
        }
        let url = upgrade_image_quality(&url);
        if !images.contains(&url) {
            images.push(url);
        }
    }
    images
}

/// Remove invisible characters and carets, collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' | '^'))
        .collect();
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Span texts joined, falling back to the element's own text.
fn element_text(el: ElementRef<'_>) -> String {
    let mut joined = String::new();
    for span in el.select(&SPAN) {
        let text = span.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() || joined.contains(text) {
            continue;
        }
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(text);
    }
    if joined.is_empty() {
        joined = el.text().collect::<String>();
    }
    clean_text(&joined)
}

fn accepted_texts(region: ElementRef<'_>, selectors: &[Selector]) -> Vec<String> {
    for sel in selectors {
        let texts: Vec<String> = region
            .select(sel)
            .map(element_text)
            .filter(|t| t.chars().count() > MIN_PARAGRAPH_CHARS)
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

/// Paragraph texts followed by quotation texts not already present.
fn paragraph_texts(region: ElementRef<'_>) -> Vec<String> {
    let mut texts = accepted_texts(region, PARAGRAPHS.as_slice());
    for quote in accepted_texts(region, QUOTATIONS.as_slice()) {
        if !texts.iter().any(|t| t.contains(&quote)) {
            texts.push(quote);
        }
    }
    texts
}

fn join_texts<'a>(texts: impl Iterator<Item = &'a String>) -> String {
    texts.map(String::as_str).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMART_EDITOR_POST: &str = r#"
    <html><body>
      <div class="se-main-container">
        <div class="se-component se-text">
          <p class="se-text-paragraph"><span>오늘은 강남 맛집을 다녀왔어요</span></p>
          <p class="se-text-paragraph"><span>분위기가</span> <span>정말 좋았습니다</span></p>
          <p class="se-text-paragraph"><span>짧음</span></p>
          <p class="se-text-paragraph"><span>메뉴는 파스타와 스테이크</span></p>
          <p class="se-text-paragraph"><span>가격도 합리적인 편이에요</span></p>
          <p class="se-text-paragraph">본 포스팅은&#8203; 업체로부터 원고료를 받아 ^작성되었습니다</p>
        </div>
        <div class="se-component se-image">
          <img class="se-image-resource" src="https://postfiles.pstatic.net/a/first.jpg?type=w80_blur">
        </div>
        <div class="se-component se-image">
          <img src="https://simg.pstatic.net/static.map/v2/map.png">
          <img data-lazy-src="https://postfiles.pstatic.net/a/last.jpg?type=w773">
        </div>
        <div class="se-component se-sticker">
          <div class="se-module se-module-sticker">
            <img class="se-sticker-image" src="https://storep-phinf.pstatic.net/ogq/first.png?type=p100_100">
          </div>
        </div>
        <a class="se-module-image-link" data-linkdata='{"src":"https://storep-phinf.pstatic.net/ogq/second.png"}'></a>
        <div class="se-module" style="background-image: url('https://post-phinf.pstatic.net/third.png')"></div>
        <blockquote class="se-quotation-container"><p>인용문 내용입니다 정말로</p></blockquote>
      </div>
    </body></html>
    "#;

    #[test]
    fn test_find_main_frame() {
        let html = r#"<html><frameset><iframe id="mainFrame" name="mainFrame" src="/PostView.naver?blogId=a&amp;logNo=1"></iframe></frameset></html>"#;
        assert_eq!(
            find_main_frame(html).as_deref(),
            Some("/PostView.naver?blogId=a&logNo=1")
        );

        let by_name = r#"<iframe name="mainFrame" src="PostView.naver?logNo=2"></iframe>"#;
        assert_eq!(find_main_frame(by_name).as_deref(), Some("PostView.naver?logNo=2"));

        assert_eq!(find_main_frame("<html><body>no frame</body></html>"), None);
    }

    #[test]
    fn test_legacy_snapshot() {
        let tables = PatternTables::default();
        let snap = extract_snapshot(
            SMART_EDITOR_POST,
            "https://blog.naver.com/a/1",
            Platform::Primary,
            false,
            &tables,
        );
        assert_eq!(snap.url, "https://blog.naver.com/a/1");
        assert_eq!(
            snap.first_image_url,
            "https://postfiles.pstatic.net/a/first.jpg?type=w773"
        );
        assert_eq!(
            snap.last_image_url,
            "https://postfiles.pstatic.net/a/last.jpg?type=w773"
        );
        assert_eq!(
            snap.first_sticker_url,
            "https://storep-phinf.pstatic.net/ogq/first.png?type=p100_100"
        );
        assert_eq!(
            snap.second_sticker_url,
            "https://storep-phinf.pstatic.net/ogq/second.png"
        );
        assert_eq!(snap.last_sticker_url, "https://post-phinf.pstatic.net/third.png");
        assert_eq!(
            snap.first_paragraph,
            "오늘은 강남 맛집을 다녀왔어요 분위기가 정말 좋았습니다 메뉴는 파스타와 스테이크"
        );
        assert!(snap
            .last_paragraph
            .contains("본 포스팅은 업체로부터 원고료를 받아 작성되었습니다"));
        assert!(snap.last_paragraph.ends_with("인용문 내용입니다 정말로"));
    }

    #[test]
    fn test_recent_snapshot_has_no_last_fields() {
        let tables = PatternTables::default();
        let snap = extract_snapshot(
            SMART_EDITOR_POST,
            "https://blog.naver.com/a/1",
            Platform::Primary,
            true,
            &tables,
        );
        assert!(!snap.first_image_url.is_empty());
        assert!(!snap.second_sticker_url.is_empty());
        assert!(snap.last_image_url.is_empty());
        assert!(snap.last_sticker_url.is_empty());
        assert!(snap.last_paragraph.is_empty());
        assert!(snap.first_paragraph.contains("원고료"));
    }

    #[test]
    fn test_empty_document_yields_empty_snapshot() {
        let tables = PatternTables::default();
        let snap = extract_snapshot(
            "<html><body></body></html>",
            "https://blog.naver.com/a/2",
            Platform::Primary,
            false,
            &tables,
        );
        assert_eq!(snap, CrawlSnapshot::new("https://blog.naver.com/a/2"));
    }

    #[test]
    fn test_secondary_platform_content() {
        let html = r#"
        <html><body>
          <div class="sidebar"><img src="https://blog.example/sidebar.png"></div>
          <div class="entry-content">
            <p>티스토리 본문 첫 문단입니다</p>
            <img src="//t1.daumcdn.net/cfile/body.jpg">
          </div>
        </body></html>"#;
        let tables = PatternTables::default();
        let snap = extract_snapshot(
            html,
            "https://a.tistory.com/1",
            Platform::Secondary,
            true,
            &tables,
        );
        assert_eq!(snap.first_image_url, "https://t1.daumcdn.net/cfile/body.jpg");
        assert_eq!(snap.first_paragraph, "티스토리 본문 첫 문단입니다");
    }

    #[test]
    fn test_sticker_fallback_scans_images() {
        let html = r#"<div><img src="https://storep-phinf.pstatic.net/plain.png"></div>"#;
        let tables = PatternTables::default();
        let snap = extract_snapshot(html, "u", Platform::Primary, true, &tables);
        assert_eq!(snap.first_sticker_url, "https://storep-phinf.pstatic.net/plain.png");
        assert!(snap.first_image_url.is_empty());
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\u{200b}b ^c\n\n d  "), "ab c d");
        assert_eq!(clean_text("\u{feff}"), "");
    }

    #[test]
    fn test_upgrade_image_quality() {
        assert_eq!(
            upgrade_image_quality("https://x.pstatic.net/a.jpg?type=w80_blur"),
            "https://x.pstatic.net/a.jpg?type=w773"
        );
        assert_eq!(upgrade_image_quality("https://x/a.jpg"), "https://x/a.jpg");
    }
}
