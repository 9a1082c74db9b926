use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use pdfgen_lib::{
    router, AppState, BrowserManager, Config, PdfRenderer, RenderError, RenderStage,
};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use url::Url;

const FAKE_PDF: &[u8] = b"%PDF-1.7\n%fake\n%%EOF\n";

#[derive(Clone, Copy)]
enum Behaviour {
    Write,
    WriteNothing,
    WriteThenFail,
    WriteThenWait,
    Fail,
}

struct FakeRenderer {
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_url: parking_lot::Mutex<Option<String>>,
    release: tokio::sync::Notify,
}

impl FakeRenderer {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            last_url: parking_lot::Mutex::new(None),
            release: tokio::sync::Notify::new(),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfRenderer for FakeRenderer {
    async fn render(&self, url: &Url, output: &Path) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock() = Some(url.to_string());
        match self.behaviour {
            Behaviour::Write => {
                tokio::fs::write(output, FAKE_PDF).await.unwrap();
                Ok(())
            }
            Behaviour::WriteNothing => Ok(()),
            Behaviour::WriteThenFail => {
                tokio::fs::write(output, b"%PDF-partial").await.unwrap();
                Err(RenderError::new(RenderStage::PrintToPdf, "target crashed"))
            }
            Behaviour::WriteThenWait => {
                tokio::fs::write(output, FAKE_PDF).await.unwrap();
                self.release.notified().await;
                Ok(())
            }
            Behaviour::Fail => Err(RenderError::new(RenderStage::Navigate, "net::ERR_FAILED")),
        }
    }
}

fn app(renderer: Arc<FakeRenderer>) -> (axum::Router, TempDir) {
    let dir = tempdir().expect("tempdir");
    let state = AppState::new(renderer, dir.path());
    (router(state), dir)
}

fn post_pdf(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn successful_render_returns_pdf_download() {
    let renderer = FakeRenderer::new(Behaviour::Write);
    let (app, dir) = app(renderer.clone());

    let response = app
        .oneshot(post_pdf(
            "/pdf",
            r#"{"url":"https://example.com","filename":"report.pdf"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=report.pdf"
    );
    assert_eq!(body_bytes(response).await, FAKE_PDF);
    assert_eq!(renderer.calls(), 1);
    assert_eq!(
        renderer.last_url.lock().as_deref(),
        Some("https://example.com/")
    );
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn uppercase_route_is_served() {
    let (app, dir) = app(FakeRenderer::new(Behaviour::Write));

    let response = app
        .oneshot(post_pdf(
            "/PDF",
            r#"{"url":"https://example.com","filename":"report.pdf"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn filename_is_percent_encoded() {
    let (app, _dir) = app(FakeRenderer::new(Behaviour::Write));

    let response = app
        .oneshot(post_pdf(
            "/pdf",
            r#"{"url":"https://example.com","filename":"Q3 résumé.pdf"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=Q3%20r%C3%A9sum%C3%A9.pdf"
    );
}

#[tokio::test]
async fn render_failure_is_opaque_500_without_leftovers() {
    for behaviour in [Behaviour::Fail, Behaviour::WriteThenFail, Behaviour::WriteNothing] {
        let (app, dir) = app(FakeRenderer::new(behaviour));

        let response = app
            .oneshot(post_pdf(
                "/pdf",
                r#"{"url":"https://example.com","filename":"report.pdf"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
        assert!(body_bytes(response).await.is_empty());
        assert!(leftover_files(dir.path()).is_empty());
    }
}

#[tokio::test]
async fn dropped_request_still_removes_the_file() {
    let renderer = FakeRenderer::new(Behaviour::WriteThenWait);
    let (app, dir) = app(renderer.clone());

    let dropped = tokio::time::timeout(
        Duration::from_millis(300),
        app.oneshot(post_pdf(
            "/pdf",
            r#"{"url":"https://example.com","filename":"report.pdf"}"#,
        )),
    )
    .await;
    assert!(dropped.is_err());
    assert_eq!(renderer.calls(), 1);

    renderer.release.notify_one();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !leftover_files(dir.path()).is_empty() {
        assert!(
            std::time::Instant::now() < deadline,
            "temp files left behind: {:?}",
            leftover_files(dir.path())
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn bad_requests_are_500_and_skip_rendering() {
    let bodies = [
        "not json",
        r#"{"url":"https://example.com"}"#,
        r#"{"filename":"report.pdf"}"#,
        r#"{"url":"example.com","filename":"report.pdf"}"#,
        r#"{"url":"file:///etc/passwd","filename":"passwd.pdf"}"#,
    ];

    for body in bodies {
        let renderer = FakeRenderer::new(Behaviour::Write);
        let (app, dir) = app(renderer.clone());

        let response = app.oneshot(post_pdf("/pdf", body)).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "body {body:?} should be rejected"
        );
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(renderer.calls(), 0);
        assert!(leftover_files(dir.path()).is_empty());
    }
}

#[tokio::test]
async fn unreachable_discovery_with_cold_cache_is_500() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.browser.discovery_url = format!("http://{addr}/json/version");
    config.browser.discovery_timeout = Duration::from_secs(2);
    config.server.temp_dir = Some(dir.path().to_path_buf());
    let state = AppState::from_config(&config).unwrap();
    assert_eq!(state.temp_dir, dir.path());

    let response = router(state)
        .oneshot(post_pdf(
            "/pdf",
            r#"{"url":"https://example.com","filename":"report.pdf"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
    assert!(leftover_files(dir.path()).is_empty());
}

#[tokio::test]
async fn health_reports_version() {
    let (app, _dir) = app(FakeRenderer::new(Behaviour::Write));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "pdfgen");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn browser_manager_is_a_renderer() {
    fn assert_renderer<T: PdfRenderer>() {}
    assert_renderer::<BrowserManager>();
}
