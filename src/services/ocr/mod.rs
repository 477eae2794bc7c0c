//! Image OCR service.
//!
//! Turns a remote image URL into short cleaned text, or a bracketed
//! sentinel when the image is skipped. Every temp file lives in a
//! `NamedTempFile` and is removed when the call returns, on every path.

mod cache;
mod types;

pub use cache::OcrCache;
pub use types::OcrSettings;

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ocr::{
    crop_if_oversized, image_extension, is_gif_signature, is_gif_url, recognize_with_fallback,
    sentinel, OcrBackend, OcrError,
};
use crate::scrapers::blog::normalize_url;
use crate::scrapers::{FetchError, HttpClient};

/// Something that can read text out of an image URL.
#[async_trait]
pub trait ImageTextExtractor: Send + Sync {
    /// Cleaned text, a sentinel for skipped images, or an error.
    async fn extract_text(&self, url: &str, cancel: &CancellationToken)
        -> Result<String, OcrError>;
}

/// Downloads, gates, crops and recognizes images.
pub struct ImageOcrService {
    client: HttpClient,
    backend: Arc<dyn OcrBackend>,
    cache: Arc<OcrCache>,
    settings: OcrSettings,
}

impl ImageOcrService {
    pub fn new(
        client: HttpClient,
        backend: Arc<dyn OcrBackend>,
        cache: Arc<OcrCache>,
        settings: OcrSettings,
    ) -> Self {
        Self {
            client,
            backend,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<OcrCache> {
        &self.cache
    }

    /// Ask the blog CDN for a medium rendition when no size is given.
    pub fn with_rendition(&self, url: &str) -> String {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let resizable = self
            .settings
            .resizable_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)));
        if !resizable || url.contains("?type=") || url.contains("&type=") {
            return url.to_string();
        }
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}type={}", url, sep, self.settings.rendition)
    }

    fn proxy_url(&self, url: &str) -> Option<String> {
        self.settings
            .worker_url
            .as_deref()
            .filter(|w| !w.is_empty())
            .map(|w| format!("{}?url={}", w, urlencoding::encode(url)))
    }

    /// HEAD the image and refuse it early when it is declared too large.
    ///
    /// A failed HEAD is not fatal; the download re-checks the size.
    async fn check_declared_size(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(), OcrError> {
        match self
            .client
            .head(url, self.settings.head_timeout, cancel)
            .await
        {
            Ok(head) => match head.content_length() {
                Some(len) if len > self.settings.max_bytes => Err(OcrError::ImageTooLarge(len)),
                _ => Ok(()),
            },
            Err(FetchError::Cancelled) => Err(OcrError::Cancelled),
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                Ok(())
            }
        }
    }

    async fn download_once(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let response = self
            .client
            .get(url, self.settings.download_timeout, cancel)
            .await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        let content_type = response.content_type().map(str::to_string);
        let body = crate::utils::cancel::scoped(
            cancel,
            self.settings.download_timeout,
            response.bytes_limited(self.settings.max_bytes),
        )
        .await??;
        Ok((body, content_type))
    }

    /// Direct download, then one attempt through the forwarding endpoint.
    async fn download(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, Option<String>), OcrError> {
        let direct_err = match self.download_once(url, cancel).await {
            Ok(found) => return Ok(found),
            Err(FetchError::TooLarge(n)) => return Err(OcrError::ImageTooLarge(n)),
            Err(FetchError::Cancelled) => return Err(OcrError::Cancelled),
            Err(e) => e,
        };

        let Some(proxy) = self.proxy_url(url) else {
            return Err(OcrError::Download(direct_err.to_string()));
        };
        debug!("Direct download of {} failed ({}), using proxy", url, direct_err);
        match self.download_once(&proxy, cancel).await {
            Ok(found) => Ok(found),
            Err(FetchError::TooLarge(n)) => Err(OcrError::ImageTooLarge(n)),
            Err(FetchError::Cancelled) => Err(OcrError::Cancelled),
            Err(e) => Err(OcrError::Download(format!(
                "direct: {}; proxy: {}",
                direct_err, e
            ))),
        }
    }

    async fn run(&self, url: &str, cancel: &CancellationToken) -> Result<String, OcrError> {
        if is_gif_url(url) {
            return Ok(sentinel::GIF.to_string());
        }
        let target = self.with_rendition(&normalize_url(url));

        self.check_declared_size(&target, cancel).await?;
        let (bytes, content_type) = self.download(&target, cancel).await?;

        if bytes.len() as u64 > self.settings.max_bytes {
            return Err(OcrError::ImageTooLarge(bytes.len() as u64));
        }
        if content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("gif"))
            || is_gif_signature(&bytes)
        {
            return Ok(sentinel::GIF.to_string());
        }
        let ext = image_extension(&bytes)?;

        let download = tempfile::Builder::new()
            .prefix("ocr-")
            .suffix(&format!(".{}", ext))
            .tempfile_in(&self.settings.temp_dir)?;
        tokio::fs::write(download.path(), &bytes).await?;
        drop(bytes);

        let cropped = self.crop(&download).await;
        let image_path = cropped
            .as_ref()
            .map(|c| c.path())
            .unwrap_or_else(|| download.path());

        let text = recognize_with_fallback(
            self.backend.as_ref(),
            image_path,
            &self.settings.recognizer,
            cancel,
        )
        .await?;

        if text.is_empty() {
            return Ok(sentinel::UNRECOGNIZED.to_string());
        }
        Ok(text)
    }

    /// Crop on the blocking pool. Decode failures fall back to the original.
    async fn crop(&self, download: &NamedTempFile) -> Option<NamedTempFile> {
        let path = download.path().to_path_buf();
        let dir = self.settings.temp_dir.clone();
        match tokio::task::spawn_blocking(move || crop_if_oversized(&path, &dir)).await {
            Ok(Ok(cropped)) => cropped,
            Ok(Err(e)) => {
                debug!("Not cropping {}: {}", download.path().display(), e);
                None
            }
            Err(e) => {
                warn!("Crop task failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ImageTextExtractor for ImageOcrService {
    async fn extract_text(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, OcrError> {
        if let Some(cached) = self.cache.get(url) {
            return Ok(cached);
        }
        match self.run(url, cancel).await {
            Ok(text) => {
                let cache = self.cache.clone();
                let key = url.to_string();
                let value = text.clone();
                tokio::spawn(async move { cache.insert(&key, &value) });
                Ok(text)
            }
            Err(OcrError::Cancelled) => Ok(sentinel::TIMEOUT.to_string()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{
        extract::Query,
        http::{header, StatusCode},
        response::IntoResponse,
        routing::get,
        Router,
    };
    use image::{DynamicImage, ImageFormat, RgbImage};

    /// Records calls and returns a fixed text.
    struct FixedBackend {
        text: String,
        calls: AtomicUsize,
        seen_existing_file: AtomicUsize,
    }

    impl FixedBackend {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
                seen_existing_file: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl OcrBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn recognize(
            &self,
            image: &Path,
            _psm: u8,
            _cancel: &CancellationToken,
        ) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if image.exists() {
                self.seen_existing_file.fetch_add(1, Ordering::SeqCst);
            }
            Ok(self.text.clone())
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[derive(serde::Deserialize)]
    struct ProxyParams {
        url: String,
    }

    async fn spawn_images() -> String {
        let router = Router::new()
            .route(
                "/img.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], png_bytes(20, 20)) }),
            )
            .route(
                "/disguised",
                get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], b"GIF89a\x01\x00\x01\x00".to_vec()) }),
            )
            .route(
                "/page",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], b"<html>blocked</html>".to_vec()) }),
            )
            .route(
                "/huge",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0u8; 4 * 1024 * 1024]) }),
            )
            .route("/blocked.png", get(|| async { StatusCode::FORBIDDEN.into_response() }))
            .route(
                "/proxy",
                get(|Query(params): Query<ProxyParams>| async move {
                    assert!(params.url.ends_with("/blocked.png"));
                    ([(header::CONTENT_TYPE, "image/png")], png_bytes(20, 20))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn service(
        backend: Arc<FixedBackend>,
        temp_dir: &Path,
        worker_url: Option<String>,
    ) -> ImageOcrService {
        ImageOcrService::new(
            HttpClient::new(None).unwrap(),
            backend,
            Arc::new(OcrCache::new()),
            OcrSettings {
                worker_url,
                temp_dir: temp_dir.to_path_buf(),
                ..OcrSettings::default()
            },
        )
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_gif_url_skips_recognizer() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FixedBackend::new("협찬");
        let svc = service(backend.clone(), dir.path(), None);

        let text = svc
            .extract_text("https://postfiles.pstatic.net/a/anim.gif", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(text, "[GIF not supported]");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recognizes_and_cleans_up() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let backend = FixedBackend::new("Estimating resolution as 100\n원고료  지원\n");
        let svc = service(backend.clone(), dir.path(), None);
        let url = format!("{}/img.png", base);

        let text = svc.extract_text(&url, &CancellationToken::new()).await.unwrap();
        assert_eq!(text, "원고료 지원");
        assert_eq!(backend.seen_existing_file.load(Ordering::SeqCst), 1);
        assert!(dir_is_empty(dir.path()));

        // The cache store runs on a spawned task.
        for _ in 0..50 {
            if svc.cache().get(&url).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let again = svc.extract_text(&url, &CancellationToken::new()).await.unwrap();
        assert_eq!(again, "원고료 지원");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gif_signature_is_rejected_after_download() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let backend = FixedBackend::new("협찬");
        let svc = service(backend.clone(), dir.path(), None);

        let text = svc
            .extract_text(&format!("{}/disguised", base), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(text, "[GIF not supported]");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_non_image_payload_is_rejected() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let svc = service(FixedBackend::new("x"), dir.path(), None);

        let err = svc
            .extract_text(&format!("{}/page", base), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::NotAnImage(_)));
        assert_eq!(err.sentinel(), "[not an image]");
    }

    #[tokio::test]
    async fn test_oversized_image_is_refused() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let backend = FixedBackend::new("x");
        let svc = service(backend.clone(), dir.path(), None);

        let err = svc
            .extract_text(&format!("{}/huge", base), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::ImageTooLarge(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_failed_download_goes_through_proxy() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let backend = FixedBackend::new("제공");
        let svc = service(backend.clone(), dir.path(), Some(format!("{}/proxy", base)));

        let text = svc
            .extract_text(&format!("{}/blocked.png", base), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(text, "제공");
    }

    #[tokio::test]
    async fn test_failed_download_without_proxy() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let svc = service(FixedBackend::new("x"), dir.path(), None);

        let err = svc
            .extract_text(&format!("{}/blocked.png", base), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Download(_)));
    }

    #[tokio::test]
    async fn test_cancelled_scope_returns_timeout_sentinel() {
        let base = spawn_images().await;
        let dir = tempfile::tempdir().unwrap();
        let backend = FixedBackend::new("x");
        let svc = service(backend.clone(), dir.path(), None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let text = svc
            .extract_text(&format!("{}/img.png", base), &cancel)
            .await
            .unwrap();
        assert_eq!(text, "[timeout]");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rendition_selector() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(FixedBackend::new("x"), dir.path(), None);
        assert_eq!(
            svc.with_rendition("https://postfiles.pstatic.net/a/b.jpg"),
            "https://postfiles.pstatic.net/a/b.jpg?type=w773"
        );
        assert_eq!(
            svc.with_rendition("https://postfiles.pstatic.net/a/b.jpg?x=1"),
            "https://postfiles.pstatic.net/a/b.jpg?x=1&type=w773"
        );
        assert_eq!(
            svc.with_rendition("https://postfiles.pstatic.net/a/b.jpg?type=w966"),
            "https://postfiles.pstatic.net/a/b.jpg?type=w966"
        );
        assert_eq!(
            svc.with_rendition("https://example.com/b.jpg"),
            "https://example.com/b.jpg"
        );
    }
}
