use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use gsa_compat_adapter::gsa::{Document, SearchResponse};
use gsa_compat_adapter::server::{router, AppState, HealthStatus};
use gsa_compat_adapter::{Config, Error, GsaRequestParams, Result, SearchEnginePort, Server};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt;

/// Engine returning a fixed page and recording what it was asked
#[derive(Debug, Default)]
struct StubEngine {
    total_hits: u64,
    documents: Vec<Document>,
    fail_with_status: Option<u16>,
    seen: Mutex<Vec<GsaRequestParams>>,
}

impl StubEngine {
    fn with_documents(count: usize, total_hits: u64) -> Self {
        let documents = (0..count)
            .map(|i| {
                Document::new()
                    .with_field("url", format!("http://example.com/{i}"))
                    .with_field("title", format!("Doc <{i}>"))
            })
            .collect();
        Self {
            total_hits,
            documents,
            ..Self::default()
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchEnginePort for StubEngine {
    async fn search(&self, params: &GsaRequestParams) -> Result<SearchResponse> {
        self.seen.lock().unwrap().push(params.clone());
        if let Some(status) = self.fail_with_status {
            return Err(Error::SearchEngine {
                status,
                message: "boom".to_string(),
            });
        }
        Ok(SearchResponse {
            exec_time: Duration::from_millis(3),
            total_hits: self.total_hits,
            documents: self.documents.clone(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn state(config: Config, engine: Arc<StubEngine>) -> AppState {
    AppState::new(Arc::new(config), engine)
}

async fn get(state: AppState, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder()
        .uri(uri)
        .header(header::ACCEPT_LANGUAGE, "fr-FR,fr;q=0.9")
        .body(Body::empty())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_gsa_search_returns_xml() {
    let engine = Arc::new(StubEngine::with_documents(2, 2));
    let (status, content_type, body) = get(
        state(Config::default(), Arc::clone(&engine)),
        "/gsa/search?q=rust+lang&num=2&sort=date:D",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/xml; charset=UTF-8");
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<Q>rust lang</Q>"));
    assert!(body.contains("<PARAM name=\"q\" value=\"rust lang\" original_value=\"rust+lang\"/>"));
    assert!(body.contains("<RES SN=\"1\" EN=\"2\">"));
    assert!(body.contains("<T>Doc &lt;1&gt;</T>"));

    let doc = roxmltree::Document::parse(&body).unwrap();
    assert!(doc.root_element().has_tag_name("GSP"));
    assert_eq!(doc.descendants().filter(|n| n.has_tag_name("R")).count(), 2);

    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].page_size(), 2);
    assert_eq!(seen[0].sort(), "timestamp.desc,score.desc");
    assert_eq!(seen[0].languages(), ["fr"]);
}

#[tokio::test]
async fn test_control_characters_in_query_stay_well_formed() {
    let engine = Arc::new(StubEngine::with_documents(1, 1));
    let (status, _, body) = get(state(Config::default(), engine), "/gsa/search?q=a%01b%0C").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Q>ab</Q>"));
    assert!(body.contains("original_value=\"a%01b%0C\""));

    let doc = roxmltree::Document::parse(&body).unwrap();
    let q = doc.descendants().find(|n| n.has_tag_name("Q")).unwrap();
    assert_eq!(q.text(), Some("ab"));
}

#[tokio::test]
async fn test_prefix_root_is_served() {
    let engine = Arc::new(StubEngine::default());
    let (status, _, body) = get(state(Config::default(), engine), "/gsa?q=x").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<RES"));
}

#[tokio::test]
async fn test_non_gsa_path_is_not_found() {
    let engine = Arc::new(StubEngine::default());
    for uri in ["/api/search?q=x", "/gsax/search", "/"] {
        let (status, _, _) = get(state(Config::default(), Arc::clone(&engine)), uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri {uri}");
    }
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_disabled_gsa_is_not_found() {
    let mut config = Config::default();
    config.gsa.enabled = false;
    let engine = Arc::new(StubEngine::default());

    let (status, _, _) = get(state(config, Arc::clone(&engine)), "/gsa/search?q=x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_output_encoding_is_bad_request() {
    let engine = Arc::new(StubEngine::with_documents(1, 1));
    let (status, _, body) = get(
        state(Config::default(), Arc::clone(&engine)),
        "/gsa/search?q=x&oe=Shift_JIS",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Shift_JIS"));
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_engine_failure_is_bad_gateway() {
    let engine = Arc::new(StubEngine::failing(503));
    let (status, _, body) = get(state(Config::default(), engine), "/gsa/search?q=x").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("503"));
}

#[tokio::test]
async fn test_post_is_method_not_allowed() {
    let engine = Arc::new(StubEngine::default());
    let request = Request::builder()
        .method("POST")
        .uri("/gsa/search")
        .body(Body::empty())
        .unwrap();
    let response = router(state(Config::default(), engine)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_custom_prefix() {
    let mut config = Config::default();
    config.gsa.path_prefix = "/appliance".to_string();
    let engine = Arc::new(StubEngine::with_documents(10, 25));

    let (status, _, body) = get(state(config, Arc::clone(&engine)), "/appliance/search?q=x").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<NU>/appliance/search?q=x&amp;start=10</NU>"));

    let (status, _, _) = get(
        state(Config::default(), engine),
        "/appliance/search?q=x",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let engine = Arc::new(StubEngine::default());
    let (status, _, body) = get(state(Config::default(), engine), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthStatus = serde_json::from_str(&body).unwrap();
    assert!(health.healthy);
    assert!(health.gsa_enabled);
    assert_eq!(health.engine, "stub");
}

#[tokio::test]
async fn test_server_graceful_shutdown() {
    let mut config = Config::default();
    config.server.port = 0;
    config.server.graceful_shutdown_timeout_secs = 1;
    let server = Arc::new(Server::new(config, Arc::new(StubEngine::default())));

    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.run().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown();
    assert!(server.is_shutdown_requested());

    let result = timeout(Duration::from_secs(3), server_handle).await;
    assert!(result.is_ok(), "Server should shut down gracefully");
    assert!(result.unwrap().unwrap().is_ok());
}
