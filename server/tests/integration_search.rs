use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use docsift_core::entities::EntityModel;
use docsift_server::{build_app, router, AppState, CorpusDoc, ServerConfig, API_KEY_HEADER};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "test-token";

fn corpus() -> Vec<CorpusDoc> {
    vec![
        CorpusDoc { title: "sky.txt".into(), text: "The sky is blue.".into() },
        CorpusDoc { title: "cats.txt".into(), text: "Cats are mammals.".into() },
    ]
}

fn app_with(corpus: Vec<CorpusDoc>, token: Option<&str>) -> Router {
    router(AppState::new(corpus, EntityModel::builtin(), token.map(str::to_string)))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap_or(Value::Null) };
    (status, json)
}

fn post(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header(API_KEY_HEADER, t);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(t) = token {
        builder = builder.header(API_KEY_HEADER, t);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = call(app_with(corpus(), None), get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn ingest_pdf_stub_echoes_url() {
    let app = app_with(corpus(), None);
    let (status, body) = call(app.clone(), post("/ingest/pdf", json!({"url": "https://example.gov/a.pdf"}), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ingested": "https://example.gov/a.pdf", "chunks": 3}));

    let (status, _) = call(app, post("/ingest/pdf", json!({"url": "x", "force": true}), None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn protected_routes_require_api_key() {
    let app = app_with(corpus(), Some(TOKEN));
    let (status, body) = call(app.clone(), post("/ask", json!({"query": "sky"}), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid API Key");

    let (status, _) = call(app.clone(), post("/search", json!({"query": "sky"}), Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(app, get("/analytics", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // no configured token locks everything, with the same answer
    let (status, body) = call(app_with(corpus(), None), post("/ask", json!({"query": "sky"}), Some(""))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"detail": "Invalid API Key"}));
}

#[tokio::test]
async fn ask_returns_best_document() {
    let app = app_with(corpus(), Some(TOKEN));
    let (status, body) = call(app, post("/ask", json!({"query": "color of sky"}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "The sky is blue.");
    assert_eq!(body["question"], "color of sky");
}

#[tokio::test]
async fn ask_without_documents_is_unavailable() {
    let app = app_with(Vec::new(), Some(TOKEN));
    let (status, _) = call(app.clone(), post("/ask", json!({"query": "color of sky"}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = call(app, post("/search", json!({"query": "sky"}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 0);
}

#[tokio::test]
async fn query_is_validated() {
    let app = app_with(corpus(), Some(TOKEN));
    let (status, _) = call(app.clone(), post("/ask", json!({"query": ""}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let long = "a".repeat(1001);
    let (status, _) = call(app.clone(), post("/search", json!({"query": long}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(app, post("/ask", json!({"query": "sky", "debug": true}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn search_returns_ranked_highlighted_hits() {
    let docs = vec![
        CorpusDoc { title: "a".into(), text: "Highway funding for rural roads".into() },
        CorpusDoc { title: "b".into(), text: "Veterans health care".into() },
        CorpusDoc { title: "c".into(), text: "Highway safety and highway transit".into() },
    ];
    let app = app_with(docs, Some(TOKEN));
    let (status, body) = call(app.clone(), post("/search", json!({"query": "highway", "k": 5}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 2);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["doc_id"], 2);
    assert_eq!(results[1]["doc_id"], 0);
    assert_eq!(results[0]["snippet"], "<em>Highway</em> safety and <em>highway</em> transit");

    let (_, body) = call(app.clone(), get("/analytics", Some(TOKEN))).await;
    assert_eq!(body["search"], 1);

    let (status, body) = call(app.clone(), get("/doc/1", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Veterans health care");
    let (status, _) = call(app, get("/doc/9", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn entities_endpoint_uses_loaded_model() {
    let app = app_with(corpus(), Some(TOKEN));
    let (status, body) = call(app, post("/entities", json!({"text": "Signed on March 3, 2023 for $5 million."}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    let labels: Vec<&str> = body["entities"].as_array().unwrap().iter().map(|e| e["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["DATE", "MONEY"]);
}

#[tokio::test]
async fn build_app_indexes_document_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("sky.txt"), "The sky is blue.").unwrap();
    fs::write(dir.path().join("cats.txt"), "Cats are mammals.").unwrap();
    let app = build_app(ServerConfig {
        docs_dir: Some(dir.path().to_path_buf()),
        api_token: Some(TOKEN.into()),
        ..ServerConfig::default()
    })
    .unwrap();

    let (status, body) = call(app, post("/search", json!({"query": "cats"}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["title"], "cats.txt");
}
