//! Common test utilities and harness for Searchbridge Sync integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use searchbridge_core::{
    BridgeConfig, CollectionSchema, DataSource, DebugInfo, Document, DocumentFilter, DriftPolicy,
    EngineClient, FieldDescriptor, FieldSchema, FieldType, Health, InMemoryEngine, InMemoryHost,
    Index, Item, LiveCollection, Metrics, RecordingNotifier, Result, SchemaConfig, ServerAuth,
};
use serde_json::Value;
use searchbridge_sync::TypesenseBackend;
use serde_json::json;

/// Read-write key the harness engine insists on for mutations.
pub const ADMIN_KEY: &str = "rw-key";

/// Configuration with complete read-only and read-write credentials.
pub const CONFIG: &str = r#"
[server]
ro_api_key = "ro-key"
rw_api_key = "rw-key"
connection_timeout_seconds = 2

[[server.nodes]]
host = "localhost"
port = 8108
protocol = "http"
"#;

/// Test harness for integration tests.
///
/// Wires a backend to an in-memory engine, host and notifier, and keeps a
/// handle on each so tests can inspect them.
pub struct TestHarness {
    /// Backend under test.
    pub backend: TypesenseBackend,
    /// Engine recording every call.
    pub engine: Arc<InMemoryEngine>,
    /// Host recording saves and reindex requests.
    pub host: Arc<InMemoryHost>,
    /// Notifier recording user-facing notices.
    pub notifier: Arc<RecordingNotifier>,
}

impl TestHarness {
    /// Harness over an empty server.
    pub fn new() -> Self {
        Self::with_engine(InMemoryEngine::new())
    }

    /// Harness over a prepared engine.
    pub fn with_engine(engine: InMemoryEngine) -> Self {
        Self::build(config(), engine)
    }

    /// Harness using the strict drift policy.
    pub fn strict(engine: InMemoryEngine) -> Self {
        let mut config = config();
        config.sync.drift_policy = DriftPolicy::Strict;
        Self::build(config, engine)
    }

    /// Harness whose engine calls each yield to the scheduler once, so
    /// hooks joined on one task interleave call by call.
    pub fn interleaved(engine: InMemoryEngine) -> Self {
        let engine = Arc::new(engine.with_admin_key(ADMIN_KEY));
        let yielding = Arc::new(YieldingEngine(engine.clone()));
        Self::assemble(config(), engine, yielding)
    }

    /// Harness with an explicit configuration.
    pub fn build(config: BridgeConfig, engine: InMemoryEngine) -> Self {
        let engine = Arc::new(engine.with_admin_key(ADMIN_KEY));
        Self::assemble(config, engine.clone(), engine)
    }

    fn assemble(
        config: BridgeConfig,
        engine: Arc<InMemoryEngine>,
        client: Arc<dyn EngineClient>,
    ) -> Self {
        let host = Arc::new(InMemoryHost::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let backend = TypesenseBackend::new(config, client, notifier.clone(), host.clone());
        Self {
            backend,
            engine,
            host,
            notifier,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// The harness configuration, parsed from [`CONFIG`].
pub fn config() -> BridgeConfig {
    BridgeConfig::from_toml_str(CONFIG).unwrap()
}

/// Host string field descriptor.
pub fn string_field(name: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, "typesense_string")
}

/// Engine string field.
pub fn string_schema(name: &str) -> FieldSchema {
    FieldSchema::new(name, FieldType::String)
}

/// The `books` index with the given string fields, declared on both sides.
pub fn books(fields: &[&str]) -> Index {
    let mut index = Index::new("books").with_schema(SchemaConfig::with_fields(
        fields.iter().map(|f| string_schema(f)).collect(),
    ));
    for field in fields {
        index.add_field(string_field(field));
    }
    index
}

/// Live `books` collection with the given string fields.
pub fn books_collection(fields: &[&str]) -> CollectionSchema {
    CollectionSchema::new("books", fields.iter().map(|f| string_schema(f)).collect())
}

/// A field-less `articles` index fed by the `node` data source.
pub fn articles() -> Index {
    Index::new("articles").with_datasource(DataSource::new("entity:node", "node"))
}

/// A book item carrying the given string fields.
pub fn book(id: &str, fields: &[(&str, &str)]) -> Item {
    fields.iter().fold(Item::new(id), |item, (name, value)| {
        item.with_field(*name, "typesense_string", vec![json!(value)])
    })
}

/// Engine that yields once before every call it forwards.
pub struct YieldingEngine(pub Arc<InMemoryEngine>);

#[async_trait]
impl EngineClient for YieldingEngine {
    fn name(&self) -> &str {
        "yielding"
    }

    async fn retrieve_collections(&self, auth: &ServerAuth) -> Result<Vec<LiveCollection>> {
        tokio::task::yield_now().await;
        self.0.retrieve_collections(auth).await
    }

    async fn retrieve_collection(
        &self,
        auth: &ServerAuth,
        name: &str,
    ) -> Result<Option<LiveCollection>> {
        tokio::task::yield_now().await;
        self.0.retrieve_collection(auth, name).await
    }

    async fn create_collection(
        &self,
        auth: &ServerAuth,
        schema: &CollectionSchema,
    ) -> Result<LiveCollection> {
        tokio::task::yield_now().await;
        self.0.create_collection(auth, schema).await
    }

    async fn drop_collection(&self, auth: &ServerAuth, name: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.0.drop_collection(auth, name).await
    }

    async fn create_document(
        &self,
        auth: &ServerAuth,
        collection: &str,
        document: &Document,
    ) -> Result<Value> {
        tokio::task::yield_now().await;
        self.0.create_document(auth, collection, document).await
    }

    async fn delete_documents(
        &self,
        auth: &ServerAuth,
        collection: &str,
        filter: &DocumentFilter,
    ) -> Result<u64> {
        tokio::task::yield_now().await;
        self.0.delete_documents(auth, collection, filter).await
    }

    async fn retrieve_health(&self, auth: &ServerAuth) -> Result<Health> {
        tokio::task::yield_now().await;
        self.0.retrieve_health(auth).await
    }

    async fn retrieve_debug(&self, auth: &ServerAuth) -> Result<DebugInfo> {
        tokio::task::yield_now().await;
        self.0.retrieve_debug(auth).await
    }

    async fn retrieve_metrics(&self, auth: &ServerAuth) -> Result<Metrics> {
        tokio::task::yield_now().await;
        self.0.retrieve_metrics(auth).await
    }
}
