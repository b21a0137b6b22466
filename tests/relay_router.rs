//! End-to-end tests for the router and the prompt relay, driven through
//! `handle_request` with provider test doubles.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use tempfile::TempDir;

use promptgate::config::{
    AppState, Config, HttpConfig, LoggingConfig, PerformanceConfig, ProviderConfig, ServerConfig,
    StaticFilesConfig,
};
use promptgate::handler::handle_request;
use promptgate::provider::{ProviderError, TextGenerator};

/// Double that records calls and returns a fixed reply
struct CountingGenerator {
    calls: AtomicUsize,
    reply: String,
}

impl CountingGenerator {
    fn new(reply: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Double that always fails with a detailed error
struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Api {
            status: 429,
            message: "quota exhausted for project 12345".to_string(),
        })
    }
}

/// Double whose reply is derived from the prompt, for cross-request checks
struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        // Yield so concurrent requests actually interleave
        tokio::task::yield_now().await;
        Ok(format!("reply:{prompt}"))
    }
}

fn test_config(asset_root: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        provider: ProviderConfig {
            api_key: "test-key".to_string(),
            model: "gemini-test".to_string(),
            api_base: "http://localhost:9".to_string(),
            timeout: 5,
        },
        static_files: StaticFilesConfig {
            root: asset_root.to_string(),
            entry_document: "index.html".to_string(),
        },
        http: HttpConfig {
            enable_cors: true,
            max_body_size: 1024,
        },
        performance: PerformanceConfig {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            access_log: false,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
    }
}

/// Asset root with an entry document and one asset
fn frontend_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>entry</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('app');").unwrap();
    dir
}

fn state_with(generator: Arc<dyn TextGenerator>, asset_root: &str) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(asset_root), generator))
}

fn peer() -> SocketAddr {
    "127.0.0.1:54321".parse().unwrap()
}

fn json_request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn get_request(path: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn body_string(response: Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn missing_prompt_returns_400_without_provider_call() {
    let dir = frontend_dir();
    let generator = Arc::new(CountingGenerator::new("unused"));
    let state = state_with(generator.clone(), dir.path().to_str().unwrap());

    for body in [
        r#"{}"#,
        r#"{"prompt":""}"#,
        r#"{"prompt":"   "}"#,
        r#"{"prompt":0}"#,
        r#"{"prompt":null}"#,
        r#"{"other":"field"}"#,
        "not json at all",
    ] {
        let req = json_request(Method::POST, "/api/generate", body);
        let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_string(resp).await, r#"{"error":"Prompt is required."}"#);
    }

    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn valid_prompt_returns_generated_text() {
    let dir = frontend_dir();
    let generator = Arc::new(CountingGenerator::new("hello"));
    let state = state_with(generator.clone(), dir.path().to_str().unwrap());

    let req = json_request(Method::POST, "/api/generate", r#"{"prompt":"say hi"}"#);
    let resp = handle_request(req, state, peer()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_string(resp).await, r#"{"text":"hello"}"#);
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn provider_failure_returns_generic_500() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    let req = json_request(Method::POST, "/api/generate", r#"{"prompt":"say hi"}"#);
    let resp = handle_request(req, state, peer()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(resp).await;
    assert_eq!(body, r#"{"error":"Failed to generate content from AI."}"#);
    // Failure detail stays in the operator log
    assert!(!body.contains("quota"));
    assert!(!body.contains("12345"));
}

#[tokio::test]
async fn existing_asset_served_not_entry_document() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    let resp = handle_request(get_request("/app.js"), state, peer())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/javascript"
    );
    assert_eq!(body_string(resp).await, "console.log('app');");
}

#[tokio::test]
async fn unmatched_get_serves_entry_document() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    for path in ["/", "/some/client/route", "/api/unknown", "/missing.png"] {
        let resp = handle_request(get_request(path), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "path: {path}");
        assert_eq!(body_string(resp).await, "<html>entry</html>");
    }
}

#[tokio::test]
async fn get_on_relay_path_falls_through_to_catch_all() {
    let dir = frontend_dir();
    let generator = Arc::new(CountingGenerator::new("unused"));
    let state = state_with(generator.clone(), dir.path().to_str().unwrap());

    let resp = handle_request(get_request("/api/generate"), state, peer())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "<html>entry</html>");
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn unmatched_post_returns_404() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    let req = json_request(Method::POST, "/api/other", r#"{"prompt":"x"}"#);
    let resp = handle_request(req, state, peer()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_requests_get_their_own_responses() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(EchoGenerator), dir.path().to_str().unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let state = Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            let body = format!(r#"{{"prompt":"p{i}"}}"#);
            let req = json_request(Method::POST, "/api/generate", &body);
            let resp = handle_request(req, state, peer()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            (i, body_string(resp).await)
        }));
    }

    for handle in handles {
        let (i, body) = handle.await.unwrap();
        assert_eq!(body, format!(r#"{{"text":"reply:p{i}"}}"#));
    }
}

#[tokio::test]
async fn oversized_body_rejected_before_reading() {
    let dir = frontend_dir();
    let generator = Arc::new(CountingGenerator::new("unused"));
    let state = state_with(generator.clone(), dir.path().to_str().unwrap());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header("Content-Length", "1048576")
        .body(Full::new(Bytes::from(r#"{"prompt":"x"}"#)))
        .unwrap();
    let resp = handle_request(req, state, peer()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn missing_entry_document_returns_404_diagnostic() {
    let dir = TempDir::new().unwrap(); // no index.html
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    let resp = handle_request(get_request("/anything"), state, peer())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string(resp).await.contains("entry document"));
}

#[tokio::test]
async fn traversal_attempt_does_not_escape_asset_root() {
    let outer = TempDir::new().unwrap();
    std::fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
    let root = outer.path().join("public");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("index.html"), "<html>entry</html>").unwrap();

    let state = state_with(Arc::new(FailingGenerator), root.to_str().unwrap());

    let resp = handle_request(get_request("/../secret.txt"), state, peer())
        .await
        .unwrap();

    let body = body_string(resp).await;
    assert!(!body.contains("top secret"));
}

#[tokio::test]
async fn head_request_mirrors_get_with_empty_body() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    let req = Request::builder()
        .method(Method::HEAD)
        .uri("/app.js")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = handle_request(req, state, peer()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("etag"));
    assert_eq!(body_string(resp).await, "");
}

#[tokio::test]
async fn asset_revalidation_returns_304() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(FailingGenerator), dir.path().to_str().unwrap());

    let first = handle_request(get_request("/app.js"), Arc::clone(&state), peer())
        .await
        .unwrap();
    let etag = first.headers().get("etag").unwrap().to_str().unwrap().to_string();

    let req = Request::builder()
        .method(Method::GET)
        .uri("/app.js")
        .header("If-None-Match", &etag)
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = handle_request(req, state, peer()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn cors_header_applied_when_enabled() {
    let dir = frontend_dir();
    let state = state_with(Arc::new(CountingGenerator::new("hi")), dir.path().to_str().unwrap());

    let req = json_request(Method::POST, "/api/generate", r#"{"prompt":"x"}"#);
    let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/generate")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = handle_request(preflight, state, peer()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-methods")
            .unwrap(),
        "GET, HEAD, POST, OPTIONS"
    );
}
