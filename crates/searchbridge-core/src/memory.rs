//! In-memory engine.
//!
//! Keeps collections and documents in a map, records every call, and can be
//! told to fail specific operations or specific documents. It backs the test
//! suites and `searchbridge sync --dry-run`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ServerAuth;
use crate::engine::{DebugInfo, EngineClient, Health, Metrics};
use crate::error::{Error, Result};
use crate::types::{CollectionSchema, Document, DocumentFilter, LiveCollection};

/// Creation timestamp handed to the first collection.
const CLOCK_START: i64 = 1_700_000_000;

/// Engine operation kinds, used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `retrieve_collections`
    RetrieveCollections,
    /// `retrieve_collection`
    RetrieveCollection,
    /// `create_collection`
    CreateCollection,
    /// `drop_collection`
    DropCollection,
    /// `create_document`
    CreateDocument,
    /// `delete_documents`
    DeleteDocuments,
    /// `retrieve_health`
    RetrieveHealth,
    /// `retrieve_debug`
    RetrieveDebug,
    /// `retrieve_metrics`
    RetrieveMetrics,
}

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// Listed collections.
    RetrieveCollections,
    /// Fetched one collection.
    RetrieveCollection(String),
    /// Created a collection.
    CreateCollection(String),
    /// Dropped a collection.
    DropCollection(String),
    /// Created a document.
    CreateDocument {
        /// Target collection.
        collection: String,
        /// Document id.
        id: String,
    },
    /// Deleted documents by filter.
    DeleteDocuments {
        /// Target collection.
        collection: String,
        /// Rendered `filter_by` expression.
        filter: String,
    },
    /// Health probe.
    RetrieveHealth,
    /// Debug probe.
    RetrieveDebug,
    /// Metrics probe.
    RetrieveMetrics,
}

impl EngineCall {
    /// Operation kind of this call.
    pub fn operation(&self) -> Operation {
        match self {
            EngineCall::RetrieveCollections => Operation::RetrieveCollections,
            EngineCall::RetrieveCollection(_) => Operation::RetrieveCollection,
            EngineCall::CreateCollection(_) => Operation::CreateCollection,
            EngineCall::DropCollection(_) => Operation::DropCollection,
            EngineCall::CreateDocument { .. } => Operation::CreateDocument,
            EngineCall::DeleteDocuments { .. } => Operation::DeleteDocuments,
            EngineCall::RetrieveHealth => Operation::RetrieveHealth,
            EngineCall::RetrieveDebug => Operation::RetrieveDebug,
            EngineCall::RetrieveMetrics => Operation::RetrieveMetrics,
        }
    }
}

#[derive(Debug)]
struct StoredCollection {
    live: LiveCollection,
    documents: BTreeMap<String, Document>,
}

#[derive(Debug)]
struct State {
    collections: BTreeMap<String, StoredCollection>,
    calls: Vec<(EngineCall, String)>,
    admin_key: Option<String>,
    operation_failures: HashMap<Operation, String>,
    document_failures: HashMap<String, String>,
    health: Health,
    debug: DebugInfo,
    metrics: Metrics,
    clock: i64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            collections: BTreeMap::new(),
            calls: Vec::new(),
            admin_key: None,
            operation_failures: HashMap::new(),
            document_failures: HashMap::new(),
            health: Health { ok: true },
            debug: DebugInfo {
                version: "in-memory".to_string(),
                state: 1,
            },
            metrics: Metrics::new(),
            clock: CLOCK_START,
        }
    }
}

impl State {
    /// Record a call with the key it carried and apply any injected failure.
    fn begin(&mut self, auth: &ServerAuth, call: EngineCall) -> Result<()> {
        let op = call.operation();
        self.calls.push((call, auth.api_key.clone()));
        match self.operation_failures.get(&op) {
            Some(message) => Err(Error::remote(message.clone())),
            None => Ok(()),
        }
    }

    fn require_admin(&self, auth: &ServerAuth) -> Result<()> {
        match &self.admin_key {
            Some(admin) if &auth.api_key != admin => Err(Error::remote(
                "Forbidden - a valid `x-typesense-api-key` header must be sent.",
            )),
            _ => Ok(()),
        }
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut StoredCollection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| Error::remote(format!("Not Found: no collection named `{name}`")))
    }
}

/// [`EngineClient`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: Mutex<State>,
}

impl InMemoryEngine {
    /// Create an empty, healthy engine that accepts any key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: pre-create a collection from a schema.
    pub fn with_collection(self, schema: &CollectionSchema) -> Self {
        if let Ok(mut state) = self.state.lock() {
            let created_at = state.clock;
            state.clock += 1;
            state.collections.insert(
                schema.name.clone(),
                StoredCollection {
                    live: LiveCollection::from_schema(schema, created_at),
                    documents: BTreeMap::new(),
                },
            );
        }
        self
    }

    /// Builder: pre-create a collection exactly as the engine would report it.
    pub fn with_live_collection(self, live: LiveCollection) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.collections.insert(
                live.name.clone(),
                StoredCollection {
                    live,
                    documents: BTreeMap::new(),
                },
            );
        }
        self
    }

    /// Builder: reject mutations unless the call carries `key`.
    pub fn with_admin_key(self, key: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.admin_key = Some(key.into());
        }
        self
    }

    /// Make every call of an operation fail with `message`.
    pub fn fail_operation(&self, op: Operation, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.operation_failures.insert(op, message.into());
        }
    }

    /// Make `create_document` fail for one document id.
    pub fn fail_document(&self, id: impl Into<String>, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.document_failures.insert(id.into(), message.into());
        }
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.operation_failures.clear();
            state.document_failures.clear();
        }
    }

    /// Set the health probe response.
    pub fn set_health(&self, health: Health) {
        if let Ok(mut state) = self.state.lock() {
            state.health = health;
        }
    }

    /// Set the debug probe response.
    pub fn set_debug(&self, debug: DebugInfo) {
        if let Ok(mut state) = self.state.lock() {
            state.debug = debug;
        }
    }

    /// Set the metrics probe response.
    pub fn set_metrics(&self, metrics: Metrics) {
        if let Ok(mut state) = self.state.lock() {
            state.metrics = metrics;
        }
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls_with_keys()
            .into_iter()
            .map(|(call, _)| call)
            .collect()
    }

    /// Every call so far, paired with the API key it was sent with.
    pub fn calls_with_keys(&self) -> Vec<(EngineCall, String)> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Number of calls of one operation kind.
    pub fn count(&self, op: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation() == op)
            .count()
    }

    /// Forget recorded calls; collections and failures are kept.
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.calls.clear();
        }
    }

    /// A collection as currently stored.
    pub fn collection(&self, name: &str) -> Option<LiveCollection> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.collections.get(name).map(|c| c.live.clone()))
    }

    /// Names of all stored collections.
    pub fn collection_names(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.collections.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Documents stored in a collection, ordered by id.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state
            .lock()
            .ok()
            .and_then(|s| {
                s.collections
                    .get(collection)
                    .map(|c| c.documents.values().cloned().collect())
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::remote("engine state lock poisoned"))
    }
}

#[async_trait]
impl EngineClient for InMemoryEngine {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn retrieve_collections(&self, auth: &ServerAuth) -> Result<Vec<LiveCollection>> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::RetrieveCollections)?;
        Ok(state.collections.values().map(|c| c.live.clone()).collect())
    }

    async fn retrieve_collection(
        &self,
        auth: &ServerAuth,
        name: &str,
    ) -> Result<Option<LiveCollection>> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::RetrieveCollection(name.to_string()))?;
        Ok(state.collections.get(name).map(|c| c.live.clone()))
    }

    async fn create_collection(
        &self,
        auth: &ServerAuth,
        schema: &CollectionSchema,
    ) -> Result<LiveCollection> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::CreateCollection(schema.name.clone()))?;
        state.require_admin(auth)?;

        if !schema.is_creatable() {
            return Err(Error::remote("Bad Request: schema must contain fields"));
        }
        if state.collections.contains_key(&schema.name) {
            return Err(Error::remote(format!(
                "Conflict: a collection with name `{}` already exists",
                schema.name
            )));
        }

        let created_at = state.clock;
        state.clock += 1;
        let live = LiveCollection::from_schema(schema, created_at);
        state.collections.insert(
            schema.name.clone(),
            StoredCollection {
                live: live.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(live)
    }

    async fn drop_collection(&self, auth: &ServerAuth, name: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::DropCollection(name.to_string()))?;
        state.require_admin(auth)?;
        state
            .collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::remote(format!("Not Found: no collection named `{name}`")))
    }

    async fn create_document(
        &self,
        auth: &ServerAuth,
        collection: &str,
        document: &Document,
    ) -> Result<Value> {
        let id = document.id().unwrap_or_default().to_string();
        let mut state = self.lock()?;
        state.begin(
            auth,
            EngineCall::CreateDocument {
                collection: collection.to_string(),
                id: id.clone(),
            },
        )?;
        state.require_admin(auth)?;

        if let Some(message) = state.document_failures.get(&id) {
            return Err(Error::remote(message.clone()));
        }
        if id.is_empty() {
            return Err(Error::remote("Bad Request: document has no `id`"));
        }

        let stored = state.collection_mut(collection)?;
        stored.documents.insert(id, document.clone());
        stored.live.num_documents = stored.documents.len() as u64;
        Ok(serde_json::to_value(document)?)
    }

    async fn delete_documents(
        &self,
        auth: &ServerAuth,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64> {
        let mut state = self.lock()?;
        state.begin(
            auth,
            EngineCall::DeleteDocuments {
                collection: collection.to_string(),
                filter: filter.to_filter_by(),
            },
        )?;
        state.require_admin(auth)?;

        let stored = state.collection_mut(collection)?;
        let before = stored.documents.len();
        stored.documents.retain(|_, doc| !filter.matches(doc));
        stored.live.num_documents = stored.documents.len() as u64;
        Ok((before - stored.documents.len()) as u64)
    }

    async fn retrieve_health(&self, auth: &ServerAuth) -> Result<Health> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::RetrieveHealth)?;
        Ok(state.health)
    }

    async fn retrieve_debug(&self, auth: &ServerAuth) -> Result<DebugInfo> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::RetrieveDebug)?;
        Ok(state.debug.clone())
    }

    async fn retrieve_metrics(&self, auth: &ServerAuth) -> Result<Metrics> {
        let mut state = self.lock()?;
        state.begin(auth, EngineCall::RetrieveMetrics)?;
        Ok(state.metrics.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{AccessMode, Node, Protocol, ServerConfig};
    use crate::types::{FieldSchema, FieldType};
    use serde_json::json;

    fn schema(name: &str) -> CollectionSchema {
        CollectionSchema::new(name, vec![FieldSchema::new("title", FieldType::String)])
    }

    fn auth(key: &str) -> ServerAuth {
        let config = ServerConfig {
            ro_api_key: Some(key.to_string()),
            rw_api_key: Some(key.to_string()),
            connection_timeout_seconds: Some(2),
            nodes: vec![Node::new("localhost", 8108, Protocol::Http)],
        };
        ServerAuth::from_config(&config, AccessMode::ReadOnly).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_retrieve() {
        let engine = InMemoryEngine::new();
        let key = auth("key");
        let created = engine.create_collection(&key, &schema("books")).await.unwrap();
        assert_eq!(created.created_at, CLOCK_START);

        let fetched = engine
            .retrieve_collection(&key, "books")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.fields.len(), 1);
        assert!(
            engine
                .retrieve_collection(&key, "missing")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(engine.retrieve_collections(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_conflict_and_empty_schema() {
        let engine = InMemoryEngine::new().with_collection(&schema("books"));
        let key = auth("key");
        assert!(engine.create_collection(&key, &schema("books")).await.is_err());
        assert!(
            engine
                .create_collection(&key, &CollectionSchema::new("empty", vec![]))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_drop_missing_collection_fails() {
        let engine = InMemoryEngine::new();
        let err = engine.drop_collection(&auth("key"), "ghost").await.unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_documents_and_counts() {
        let engine = InMemoryEngine::new().with_collection(&schema("books"));
        let key = auth("key");
        for id in ["1", "2", "3"] {
            let mut doc = Document::new(id);
            doc.insert("title", json!("t"));
            let echo = engine.create_document(&key, "books", &doc).await.unwrap();
            assert_eq!(echo["id"], id);
        }
        assert_eq!(engine.collection("books").unwrap().num_documents, 3);

        let removed = engine
            .delete_documents(&key, "books", &DocumentFilter::ids(["1", "3", "9"]))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(engine.documents("books").len(), 1);
        assert_eq!(engine.collection("books").unwrap().num_documents, 1);
    }

    #[tokio::test]
    async fn test_document_failure_injection() {
        let engine = InMemoryEngine::new().with_collection(&schema("books"));
        let key = auth("key");
        engine.fail_document("bad", "Bad Request: field `title` must be a string");

        assert!(
            engine
                .create_document(&key, "books", &Document::new("bad"))
                .await
                .is_err()
        );
        assert!(
            engine
                .create_document(&key, "books", &Document::new("good"))
                .await
                .is_ok()
        );
        assert_eq!(engine.count(Operation::CreateDocument), 2);
    }

    #[tokio::test]
    async fn test_operation_failure_injection() {
        let engine = InMemoryEngine::new();
        let key = auth("key");
        engine.fail_operation(Operation::RetrieveHealth, "connection refused");

        let err = engine.retrieve_health(&key).await.unwrap_err();
        assert_eq!(err.to_string(), "Remote engine error: connection refused");
        assert_eq!(engine.calls(), vec![EngineCall::RetrieveHealth]);

        engine.clear_failures();
        assert!(engine.retrieve_health(&key).await.unwrap().ok);
    }

    #[tokio::test]
    async fn test_admin_key_guards_mutations() {
        let engine = InMemoryEngine::new().with_admin_key("admin");

        assert!(
            engine
                .create_collection(&auth("search"), &schema("books"))
                .await
                .is_err()
        );
        assert!(engine.retrieve_collections(&auth("search")).await.is_ok());
        assert!(
            engine
                .create_collection(&auth("admin"), &schema("books"))
                .await
                .is_ok()
        );

        let keys: Vec<String> = engine
            .calls_with_keys()
            .into_iter()
            .map(|(_, key)| key)
            .collect();
        assert_eq!(keys, vec!["search", "search", "admin"]);
    }

    #[tokio::test]
    async fn test_interleaved_keys_do_not_leak_between_calls() {
        let engine = InMemoryEngine::new()
            .with_admin_key("admin")
            .with_collection(&schema("books"));
        let admin = auth("admin");
        let search = auth("search");

        assert!(
            engine
                .create_document(&admin, "books", &Document::new("1"))
                .await
                .is_ok()
        );
        assert!(engine.retrieve_debug(&search).await.is_ok());
        assert!(
            engine
                .create_document(&admin, "books", &Document::new("2"))
                .await
                .is_ok()
        );
        assert_eq!(engine.documents("books").len(), 2);
    }
}
