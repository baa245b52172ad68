pub mod analytics;

use analytics::Analytics;
use anyhow::Result;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docsift_core::entities::{EntityMention, EntityModel};
use docsift_core::models::{IngestResult, PdfIn};
use docsift_core::{Error as CoreError, Rag, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const MAX_QUERY_CHARS: usize = 1000;
const MAX_K: usize = 100;
// Placeholder chunk count reported by the PDF ingest stub.
const STUB_CHUNKS: u32 = 3;

/// Validated user query. Unknown fields are rejected at deserialization.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputModel {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitiesInput {
    pub text: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: usize,
    pub score: f32,
    pub title: String,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
}

#[derive(Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<EntityMention>,
}

#[derive(Debug, Clone)]
pub struct CorpusDoc {
    pub title: String,
    pub text: String,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Vec<CorpusDoc>>,
    pub rag: Arc<Rag>,
    pub entities: Arc<EntityModel>,
    pub analytics: Arc<Analytics>,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(corpus: Vec<CorpusDoc>, entities: EntityModel, api_token: Option<String>) -> Self {
        let rag = Rag::new(corpus.iter().map(|d| d.text.clone()).collect());
        Self {
            corpus: Arc::new(corpus),
            rag: Arc::new(rag),
            entities: Arc::new(entities),
            analytics: Arc::new(Analytics::new()),
            api_token,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Directory of PDF/DOCX/TXT files to index at startup
    pub docs_dir: Option<PathBuf>,
    /// JSON pattern file for the entity model; builtin rules otherwise
    pub entity_patterns: Option<PathBuf>,
    pub api_token: Option<String>,
    /// Comma-separated list; any origin when unset or unparsable
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    /// Read `API_TOKEN` and `CORS_ALLOW_ORIGIN` from the environment.
    pub fn with_env(mut self) -> Self {
        self.api_token = std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty());
        self.cors_allow_origin = std::env::var("CORS_ALLOW_ORIGIN").ok();
        self
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let corpus = match &config.docs_dir {
        Some(dir) => docsift_ingest::load_dir(dir)?
            .into_iter()
            .map(|d| CorpusDoc { title: d.title(), text: d.text })
            .collect(),
        None => Vec::new(),
    };
    let entities = match &config.entity_patterns {
        Some(path) => EntityModel::load(path)?,
        None => EntityModel::builtin(),
    };
    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN not set; protected routes will reject every request");
    }
    tracing::info!(num_docs = corpus.len(), "corpus loaded");

    let state = AppState::new(corpus, entities, config.api_token.clone());
    Ok(router(state).layer(cors_layer(config.cors_allow_origin.as_deref())))
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/search", post(search_handler))
        .route("/ask", post(ask_handler))
        .route("/entities", post(entities_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/analytics", get(analytics_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .route("/ingest/pdf", post(ingest_pdf))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<_> = allow_origin
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    }
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "detail": detail.into() })))
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match authorize(&state, request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.api_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "Invalid API Key")),
    };
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "Invalid API Key"))
    }
}

fn validate_query(query: &str) -> Result<(), ApiError> {
    let len = query.chars().count();
    if len == 0 || len > MAX_QUERY_CHARS {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("query must be between 1 and {MAX_QUERY_CHARS} characters"),
        ));
    }
    Ok(())
}

async fn ingest_pdf(State(state): State<AppState>, Json(payload): Json<PdfIn>) -> Json<IngestResult> {
    state.analytics.track("ingest_pdf");
    // Typed stub: nothing is fetched or parsed yet.
    Json(IngestResult { ingested: payload.url, chunks: STUB_CHUNKS })
}

pub async fn search_handler(State(state): State<AppState>, Json(params): Json<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    validate_query(&params.query)?;
    state.analytics.track("search");
    let start = std::time::Instant::now();

    let Some(search) = state.rag.search() else {
        return Ok(Json(SearchResponse { query: params.query, took_s: start.elapsed().as_secs_f64(), total_hits: 0, results: vec![] }));
    };
    let k = params.k.clamp(1, MAX_K);
    let hits: Vec<(usize, f32)> = search
        .query(&params.query, search.len())
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .collect();
    let total_hits = hits.len();

    let highlighter = Highlighter::new(&params.query);
    let results = hits
        .into_iter()
        .take(k)
        .filter_map(|(doc_id, score)| {
            let doc = state.corpus.get(doc_id)?;
            let snippet = highlighter.as_ref().and_then(|h| h.snippet(&doc.text));
            Some(SearchHit { doc_id, score, title: doc.title.clone(), snippet })
        })
        .collect();

    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.query, total_hits, took_s, "search");
    Ok(Json(SearchResponse { query: params.query, took_s, total_hits, results }))
}

pub async fn ask_handler(State(state): State<AppState>, Json(input): Json<InputModel>) -> Result<Json<AskResponse>, ApiError> {
    validate_query(&input.query)?;
    state.analytics.track("ask");
    match state.rag.ask(&input.query) {
        Ok(answer) => Ok(Json(AskResponse { question: input.query, answer })),
        Err(CoreError::NoDocuments) => Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "no documents indexed")),
        Err(err) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

pub async fn entities_handler(State(state): State<AppState>, Json(input): Json<EntitiesInput>) -> Result<Json<EntitiesResponse>, ApiError> {
    if input.text.is_empty() {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, "text must not be empty"));
    }
    state.analytics.track("entities");
    Ok(Json(EntitiesResponse { entities: state.entities.extract(&input.text) }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<usize>) -> Result<Json<serde_json::Value>, ApiError> {
    state.analytics.track("doc");
    let doc = state
        .corpus
        .get(doc_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not found"))?;
    Ok(Json(serde_json::json!({ "doc_id": doc_id, "title": doc.title, "text": doc.text })))
}

pub async fn analytics_handler(State(state): State<AppState>) -> Json<BTreeMap<String, u64>> {
    Json(state.analytics.report())
}

/// Case-insensitive matcher over the words of a query, used to cut and
/// highlight snippets.
struct Highlighter {
    re: regex::Regex,
}

impl Highlighter {
    fn new(query: &str) -> Option<Self> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|t| t.chars().count() > 1)
            .map(regex::escape)
            .collect();
        if terms.is_empty() {
            return None;
        }
        let re = regex::RegexBuilder::new(&format!(r"\b(?:{})\b", terms.join("|")))
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self { re })
    }

    /// About 300 bytes of text around the first match, with every match
    /// wrapped in `<em>`. Falls back to the start of the text.
    fn snippet(&self, text: &str) -> Option<String> {
        if text.is_empty() { return None; }
        let window = match self.re.find(text) {
            Some(m) => {
                let start = floor_char_boundary(text, m.start().saturating_sub(100));
                let end = floor_char_boundary(text, (m.start() + 200).min(text.len()));
                &text[start..end]
            }
            None => &text[..floor_char_boundary(text, 200.min(text.len()))],
        };
        Some(self.re.replace_all(window, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned())
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) { idx -= 1; }
    idx
}
