//! Remote engine abstraction.
//!
//! Everything the bridge asks of the search server goes through
//! [`EngineClient`]. Implementations:
//! - `TypesenseClient` (searchbridge-client): the HTTP API
//! - [`InMemoryEngine`](crate::memory::InMemoryEngine): bookkeeping only, for
//!   tests and dry runs
//!
//! Every failure, transport or API, surfaces as
//! [`Error::RemoteEngine`](crate::Error::RemoteEngine).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ServerAuth;
use crate::error::Result;
use crate::types::{CollectionSchema, Document, DocumentFilter, LiveCollection};

/// `GET /health` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Health {
    /// Server reports itself healthy.
    #[serde(default)]
    pub ok: bool,
}

/// `GET /debug` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Server version string.
    #[serde(default)]
    pub version: String,
    /// Raft state; zero means the node is not serving.
    #[serde(default)]
    pub state: i64,
}

/// Numeric server metrics keyed by metric name.
pub type Metrics = BTreeMap<String, f64>;

/// Operations the bridge performs against the remote search engine.
///
/// Every remote call carries the credentials it is sent with; an
/// implementation holds no per-caller authorization state, so concurrent
/// callers using different keys cannot interfere.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// List every collection on the server.
    async fn retrieve_collections(&self, auth: &ServerAuth) -> Result<Vec<LiveCollection>>;

    /// Fetch one collection, `None` if it does not exist.
    async fn retrieve_collection(
        &self,
        auth: &ServerAuth,
        name: &str,
    ) -> Result<Option<LiveCollection>>;

    /// Create a collection.
    async fn create_collection(
        &self,
        auth: &ServerAuth,
        schema: &CollectionSchema,
    ) -> Result<LiveCollection>;

    /// Drop a collection and everything in it.
    async fn drop_collection(&self, auth: &ServerAuth, name: &str) -> Result<()>;

    /// Create one document; returns the engine's echo of the stored record.
    async fn create_document(
        &self,
        auth: &ServerAuth,
        collection: &str,
        document: &Document,
    ) -> Result<Value>;

    /// Delete every document matching the filter; returns how many were removed.
    async fn delete_documents(
        &self,
        auth: &ServerAuth,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64>;

    /// Server health.
    async fn retrieve_health(&self, auth: &ServerAuth) -> Result<Health>;

    /// Server debug info.
    async fn retrieve_debug(&self, auth: &ServerAuth) -> Result<DebugInfo>;

    /// Server metrics.
    async fn retrieve_metrics(&self, auth: &ServerAuth) -> Result<Metrics>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_debug_info_tolerates_extra_keys() {
        let debug: DebugInfo =
            serde_json::from_value(json!({"state": 1, "version": "27.1", "extra": true})).unwrap();
        assert_eq!(debug.state, 1);
        assert_eq!(debug.version, "27.1");
    }

    #[test]
    fn test_health_defaults_to_not_ok() {
        let health: Health = serde_json::from_value(json!({})).unwrap();
        assert!(!health.ok);
    }

    #[test]
    fn test_engine_client_is_object_safe() {
        fn _assert(_: &dyn EngineClient) {}
    }
}
