//! Availability and the status page.

use searchbridge_core::{BridgeConfig, InMemoryEngine, Operation};
use searchbridge_sync::{ConnectionState, SERVER_INFO_ERROR, StatusInfo};

use crate::common::{TestHarness, book, books, books_collection};

#[tokio::test]
async fn test_status_after_indexing() {
    let harness =
        TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title"]);
    harness
        .backend
        .index_items(&index, &[book("1", &[("title", "Dune")])])
        .await;

    let report = harness.backend.view_settings(&[index]).await;

    assert!(!report.degraded);
    assert_eq!(
        report.entry("Typesense collection 1: name").unwrap().info,
        StatusInfo::Text("books".into())
    );
    assert_eq!(
        report.entry("Typesense collection 1: documents").unwrap().info,
        StatusInfo::Text("1".into())
    );
    assert!(harness.backend.is_available().await);
}

#[tokio::test]
async fn test_connect_then_refresh() {
    let harness = TestHarness::new();
    assert!(harness.backend.connect().await.collections().is_empty());

    harness
        .backend
        .sync_indexes_and_collections(&[books(&["title"])])
        .await;

    let state = harness.backend.refresh().await;
    assert!(state.is_connected());
    assert_eq!(state.collections()[0].name, "books");
    assert_eq!(harness.backend.connection().state(), state);
}

#[tokio::test]
async fn test_unreachable_server() {
    let harness = TestHarness::new();
    harness
        .engine
        .fail_operation(Operation::RetrieveCollection, "connection refused");
    harness
        .engine
        .fail_operation(Operation::RetrieveDebug, "connection refused");

    assert!(!harness.backend.is_available().await);

    let report = harness.backend.view_settings(&[books(&["title"])]).await;
    assert!(report.degraded);
    assert!(report.entries.is_empty());
    assert_eq!(harness.notifier.errors(), vec![SERVER_INFO_ERROR.to_string()]);
}

#[tokio::test]
async fn test_unconfigured_backend_stays_quiet() {
    let harness = TestHarness::build(BridgeConfig::empty(), InMemoryEngine::new());

    assert_eq!(harness.backend.connect().await, ConnectionState::Unconfigured);
    assert!(!harness.backend.is_available().await);
    assert!(harness.engine.calls().is_empty());
    assert!(harness.notifier.notices().is_empty());
}
