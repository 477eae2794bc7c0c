//! HTTP server for sponsorship search.
//!
//! Exposes the search-and-evaluate endpoint, job status for background OCR
//! work and a health probe. The queue worker runs alongside the server in the
//! same process.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::analysis::{Classifier, PatternTables};
use crate::config::Settings;
use crate::ocr::TesseractBackend;
use crate::repository::{MemoryOcrRepository, OcrRepository};
use crate::scrapers::{HttpClient, WebBlogCrawler};
use crate::services::{
    ChannelQueue, ImageOcrService, NaverSearchClient, OcrCache, OcrQueue, OcrQueueWorker,
    PostEvaluator, QueueDispatcher, SearchService,
};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub repository: Arc<dyn OcrRepository>,
    /// Deadline for one search request, crawl and OCR included.
    pub request_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        search: Arc<SearchService>,
        repository: Arc<dyn OcrRepository>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            search,
            repository,
            request_timeout,
            started_at: Instant::now(),
        }
    }
}

/// Wire up the production pipeline.
///
/// Returns the server state and the worker that drains the OCR queue.
pub fn build(
    settings: &Settings,
    tables: PatternTables,
) -> anyhow::Result<(AppState, OcrQueueWorker)> {
    let client = HttpClient::new(settings.user_agent.as_deref())?;
    let ocr_settings = settings.ocr_settings();
    let backend = Arc::new(TesseractBackend::with_config(ocr_settings.recognizer.clone()));
    let ocr = Arc::new(ImageOcrService::new(
        client.clone(),
        backend,
        Arc::new(OcrCache::new()),
        ocr_settings,
    ));

    let classifier = Arc::new(Classifier::new(tables.clone()));
    let crawler = Arc::new(WebBlogCrawler::new(client.clone(), Arc::new(tables)));

    let queue: Arc<dyn OcrQueue> =
        Arc::new(ChannelQueue::new(settings.aws.sqs_queue_url.clone()));
    let repository: Arc<dyn OcrRepository> = Arc::new(MemoryOcrRepository::new());
    let dispatcher = Arc::new(QueueDispatcher::new(queue.clone(), repository.clone()));

    let evaluator = Arc::new(PostEvaluator::new(
        crawler,
        ocr.clone(),
        dispatcher,
        classifier.clone(),
    ));
    let api = Arc::new(NaverSearchClient::new(client, settings.naver.clone()));
    let search = Arc::new(SearchService::new(api, evaluator));

    let worker = OcrQueueWorker::new(queue, repository.clone(), ocr, classifier);
    let state = AppState::new(search, repository, settings.request_timeout);
    Ok((state, worker))
}

/// Start the web server and the OCR queue worker.
pub async fn serve(settings: &Settings, tables: PatternTables) -> anyhow::Result<()> {
    let (state, worker) = build(settings, tables)?;
    let app = create_router(state);

    tracing::info!(
        "{} using queue {} in {}",
        settings.app_name,
        settings.aws.sqs_queue_url,
        settings.aws.region
    );

    let shutdown = CancellationToken::new();
    let worker_token = shutdown.child_token();
    let worker_handle = tokio::spawn(async move { worker.run(&worker_token).await });

    let addr: SocketAddr = format!("0.0.0.0:{}", settings.port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = worker_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::models::{CrawlSnapshot, JobVerdict, OcrJob, SearchHit};
    use crate::services::detection::fakes::{FakeCrawler, FakeDispatcher, FakeOcr};
    use crate::services::search::SearchPage;
    use crate::services::{SearchApi, SearchError};

    #[derive(Default)]
    struct StubApi {
        starts: Mutex<Vec<u32>>,
        fail: bool,
    }

    #[async_trait]
    impl SearchApi for StubApi {
        async fn search_blog(
            &self,
            _query: &str,
            _display: u32,
            start: u32,
            _cancel: &CancellationToken,
        ) -> Result<SearchPage, SearchError> {
            self.starts.lock().unwrap().push(start);
            if self.fail {
                return Err(SearchError::Upstream {
                    status: reqwest::StatusCode::UNAUTHORIZED,
                    body: "Authentication failed".to_string(),
                });
            }
            Ok(SearchPage {
                total: 42,
                items: vec![SearchHit {
                    link: "https://blog.naver.com/a/1".to_string(),
                    description: "<b>협찬</b> 받은 후기".to_string(),
                    post_date: "20240101".to_string(),
                    ..SearchHit::default()
                }],
            })
        }
    }

    fn setup_test_app(api: Arc<StubApi>) -> (axum::Router, Arc<MemoryOcrRepository>) {
        let evaluator = Arc::new(PostEvaluator::new(
            Arc::new(FakeCrawler {
                snapshot: Some(CrawlSnapshot::new("u")),
                calls: Default::default(),
            }),
            Arc::new(FakeOcr::default()),
            Arc::new(FakeDispatcher::default()),
            Arc::new(Classifier::default()),
        ));
        let repository = Arc::new(MemoryOcrRepository::new());
        let state = AppState::new(
            Arc::new(SearchService::new(api, evaluator)),
            repository.clone(),
            Duration::from_secs(5),
        );
        (create_router(state), repository)
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = setup_test_app(Arc::new(StubApi::default()));
        let (status, json) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["uptime"].is_u64());
        assert!(json["time"].is_string());
    }

    #[tokio::test]
    async fn test_search() {
        let api = Arc::new(StubApi::default());
        let (app, _) = setup_test_app(api.clone());
        let uri = format!(
            "/search?query={}&limit=5&offset=10",
            urlencoding::encode("캠핑 의자")
        );
        let (status, json) = get_json(app, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["keyword"], "캠핑 의자");
        assert_eq!(json["totalResults"], 42);
        assert_eq!(json["sponsoredResults"], 1);
        assert_eq!(json["page"], 3);
        assert_eq!(json["itemsPerPage"], 5);
        assert_eq!(json["posts"][0]["isSponsored"], true);
        assert_eq!(*api.starts.lock().unwrap(), vec![11]);
    }

    #[tokio::test]
    async fn test_versioned_search_route() {
        let (app, _) = setup_test_app(Arc::new(StubApi::default()));
        let (status, json) = get_json(app, "/api/v1/search?query=camping").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["page"], 1);
    }

    #[tokio::test]
    async fn test_search_validation() {
        let api = Arc::new(StubApi::default());

        for uri in [
            "/search",
            "/search?query=a",
            "/search?query=%20%20a%20%20",
            "/search?query=camping&limit=0",
            "/search?query=camping&limit=101",
            "/search?query=camping&limit=abc",
            "/search?query=camping&offset=1000",
        ] {
            let (app, _) = setup_test_app(api.clone());
            let (status, json) = get_json(app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(json["error"].is_string(), "{}", uri);
        }
        assert!(api.starts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_upstream_failure() {
        let (app, _) = setup_test_app(Arc::new(StubApi {
            fail: true,
            ..StubApi::default()
        }));
        let (status, json) = get_json(app, "/search?query=camping").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_job_status() {
        let (app, repository) = setup_test_app(Arc::new(StubApi::default()));
        let job = OcrJob::new(CrawlSnapshot::new("https://blog.naver.com/a/1"), true);
        repository.save_job(&JobVerdict::pending(&job)).await.unwrap();

        let (status, json) = get_json(app.clone(), &format!("/ocr/{}", job.job_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["jobId"], job.job_id.as_str());
        assert_eq!(json["status"], "pending");

        let (status, json) = get_json(app, "/ocr/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
    }
}
