//! Typesense HTTP client.
//!
//! Implements [`EngineClient`] over the Typesense REST API. The client holds
//! no credentials: each call takes the [`ServerAuth`] to send with it, so one
//! client serves read-only and read-write callers at the same time. HTTP
//! connection pools are shared between calls with the same connect timeout.
//!
//! # Failover
//!
//! Nodes are tried in configured order. The next node is only tried when a
//! request could not reach the current one (connect failure or timeout); any
//! HTTP response, successful or not, is final.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use searchbridge_core::{
    CollectionSchema, DebugInfo, Document, DocumentFilter, EngineClient, Error, Health,
    LiveCollection, Metrics, Result, ServerAuth,
};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// `DELETE .../documents` response.
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    num_deleted: u64,
}

/// Typesense REST client.
#[derive(Debug, Default)]
pub struct TypesenseClient {
    /// HTTP clients keyed by connect timeout.
    http: Mutex<HashMap<Duration, reqwest::Client>>,
}

impl TypesenseClient {
    /// Create a client with no connections open yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP client for a connect timeout, built on first use.
    fn http_for(&self, timeout: Duration) -> Result<reqwest::Client> {
        let mut clients = self
            .http
            .lock()
            .map_err(|_| Error::remote("HTTP client cache lock poisoned"))?;
        if let Some(http) = clients.get(&timeout) {
            return Ok(http.clone());
        }

        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::remote(format!("failed to build HTTP client: {e}")))?;
        clients.insert(timeout, http.clone());
        Ok(http)
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// Send a request to the first reachable node.
    async fn send<F>(
        &self,
        auth: &ServerAuth,
        method: Method,
        segments: &[&str],
        customize: F,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let http = self.http_for(auth.connection_timeout)?;
        let mut last_error = None;

        for node in &auth.nodes {
            let url = endpoint(&node.base_url(), segments)?;
            let request = http
                .request(method.clone(), url)
                .header(API_KEY_HEADER, &auth.api_key);

            match customize(request).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    log::warn!("Typesense node {} unreachable: {e}", node.base_url());
                    last_error = Some(e);
                }
                Err(e) => return Err(Error::remote(e.to_string())),
            }
        }

        Err(match last_error {
            Some(e) => Error::remote(format!("no Typesense node reachable: {e}")),
            None => Error::remote("no Typesense nodes configured"),
        })
    }

    /// Send and decode a JSON body, failing on any non-success status.
    async fn call<T, F>(
        &self,
        auth: &ServerAuth,
        method: Method,
        segments: &[&str],
        customize: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let response = self.send(auth, method, segments, customize).await?;
        decode(check(response).await?).await
    }
}

/// Build `<base>/<segments...>` with each segment percent-encoded.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::config(format!("invalid node URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::config(format!("node URL cannot carry a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into a remote error carrying the engine message.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    Err(Error::remote(format!("{status}: {message}")))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| Error::remote(format!("unexpected response body: {e}")))
}

/// Keep numeric metrics; string values are parsed, anything else is dropped.
pub fn parse_metrics(raw: &serde_json::Map<String, Value>) -> Metrics {
    raw.iter()
        .filter_map(|(name, value)| {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            number.map(|n| (name.clone(), n))
        })
        .collect()
}

#[async_trait]
impl EngineClient for TypesenseClient {
    fn name(&self) -> &str {
        "typesense"
    }

    async fn retrieve_collections(&self, auth: &ServerAuth) -> Result<Vec<LiveCollection>> {
        self.call(auth, Method::GET, &["collections"], |r| r).await
    }

    async fn retrieve_collection(
        &self,
        auth: &ServerAuth,
        name: &str,
    ) -> Result<Option<LiveCollection>> {
        let response = self
            .send(auth, Method::GET, &["collections", name], |r| r)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(check(response).await?).await.map(Some)
    }

    async fn create_collection(
        &self,
        auth: &ServerAuth,
        schema: &CollectionSchema,
    ) -> Result<LiveCollection> {
        log::debug!("Creating Typesense collection '{}'", schema.name);
        self.call(auth, Method::POST, &["collections"], |r| r.json(schema))
            .await
    }

    async fn drop_collection(&self, auth: &ServerAuth, name: &str) -> Result<()> {
        log::debug!("Dropping Typesense collection '{name}'");
        let _: Value = self
            .call(auth, Method::DELETE, &["collections", name], |r| r)
            .await?;
        Ok(())
    }

    async fn create_document(
        &self,
        auth: &ServerAuth,
        collection: &str,
        document: &Document,
    ) -> Result<Value> {
        self.call(
            auth,
            Method::POST,
            &["collections", collection, "documents"],
            |r| r.json(document),
        )
        .await
    }

    async fn delete_documents(
        &self,
        auth: &ServerAuth,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64> {
        let filter_by = filter.to_filter_by();
        let response: DeleteResponse = self
            .call(
                auth,
                Method::DELETE,
                &["collections", collection, "documents"],
                |r| r.query(&[("filter_by", filter_by.as_str())]),
            )
            .await?;
        Ok(response.num_deleted)
    }

    async fn retrieve_health(&self, auth: &ServerAuth) -> Result<Health> {
        self.call(auth, Method::GET, &["health"], |r| r).await
    }

    async fn retrieve_debug(&self, auth: &ServerAuth) -> Result<DebugInfo> {
        self.call(auth, Method::GET, &["debug"], |r| r).await
    }

    async fn retrieve_metrics(&self, auth: &ServerAuth) -> Result<Metrics> {
        let raw: serde_json::Map<String, Value> = self
            .call(auth, Method::GET, &["metrics.json"], |r| r)
            .await?;
        Ok(parse_metrics(&raw))
    }
}

// ============================================================================
// Tests
// ============================================================================
