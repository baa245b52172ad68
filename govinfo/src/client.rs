use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_API_BASE: &str = "https://api.govinfo.gov";
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";

#[derive(Error, Debug)]
pub enum GovInfoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{url} returned {status}")]
    Status { status: StatusCode, url: String },

    #[error("schedule interval must be non-zero")]
    InvalidInterval,
}

pub type Result<T> = std::result::Result<T, GovInfoError>;

#[derive(Debug, Clone)]
pub struct GovInfoConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for GovInfoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl GovInfoConfig {
    /// `GOVINFO_API_KEY` and `GOVINFO_API_BASE` override the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("GOVINFO_API_KEY") {
            config.api_key = key;
        }
        if let Ok(base) = std::env::var("GOVINFO_API_BASE") {
            config.base_url = base;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct GovInfoClient {
    http: Client,
    base: Url,
    api_key: String,
}

impl GovInfoClient {
    pub fn new(config: GovInfoConfig) -> Result<Self> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| GovInfoError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        let http = Client::builder()
            .user_agent(concat!("docsift/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, base, api_key: config.api_key })
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GovInfoError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend([collection, doc_id]);
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        Ok(url)
    }

    /// GET `{base}/{collection}/{doc_id}` and return the JSON body.
    pub async fn fetch_document(&self, collection: &str, doc_id: &str) -> Result<Value> {
        let url = self.document_url(collection, doc_id)?;
        tracing::debug!(collection, doc_id, "fetching govinfo document");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            // strip the key before it ends up in logs
            let mut shown = resp.url().clone();
            shown.set_query(None);
            return Err(GovInfoError::Status { status, url: shown.to_string() });
        }
        Ok(resp.json().await?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchedDocument {
    pub collection: String,
    pub doc_id: String,
    pub fetched_at: String,
    pub body: Value,
}

/// Re-fetch a document every `every` (the first fetch happens immediately)
/// and forward each successful response to `tx`. Failed fetches are logged
/// and retried on the next tick. The task ends once the receiver is dropped.
/// A zero interval is rejected before anything is spawned.
pub fn spawn_schedule(
    client: GovInfoClient,
    collection: String,
    doc_id: String,
    every: Duration,
    tx: mpsc::Sender<FetchedDocument>,
) -> Result<JoinHandle<()>> {
    if every.is_zero() {
        return Err(GovInfoError::InvalidInterval);
    }
    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            match client.fetch_document(&collection, &doc_id).await {
                Ok(body) => {
                    let fetched_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
                    let doc = FetchedDocument { collection: collection.clone(), doc_id: doc_id.clone(), fetched_at, body };
                    if tx.send(doc).await.is_err() {
                        break;
                    }
                }
                Err(err) => tracing::warn!(%collection, %doc_id, error = %err, "scheduled fetch failed"),
            }
        }
        tracing::info!(%collection, %doc_id, "schedule stopped");
    }))
}
