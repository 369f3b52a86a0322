//! Clearing an index drops and recreates its collection.

use searchbridge_core::{InMemoryEngine, Operation, ReconciliationOutcome};

use crate::common::{TestHarness, articles, book, books, books_collection};

#[tokio::test]
async fn test_delete_all_is_one_drop_and_one_create() {
    let harness =
        TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title"]);
    harness
        .backend
        .index_items(&index, &[book("1", &[("title", "Dune")])])
        .await;

    let outcome = harness.backend.delete_all_items(&index).await;

    assert_eq!(outcome, ReconciliationOutcome::Recreated);
    assert_eq!(harness.engine.count(Operation::DropCollection), 1);
    assert_eq!(harness.engine.count(Operation::CreateCollection), 1);
    assert_eq!(harness.engine.count(Operation::DeleteDocuments), 0);
    assert!(harness.engine.documents("books").is_empty());
}

#[tokio::test]
async fn test_delete_all_without_schema_only_drops() {
    let harness = TestHarness::with_engine(
        InMemoryEngine::new().with_collection(&searchbridge_core::CollectionSchema::new(
            "articles",
            vec![crate::common::string_schema("node_uuid")],
        )),
    );

    let outcome = harness.backend.delete_all_items(&articles()).await;

    assert_eq!(outcome, ReconciliationOutcome::Dropped);
    assert_eq!(harness.engine.count(Operation::DropCollection), 1);
    assert_eq!(harness.engine.count(Operation::CreateCollection), 0);
}

#[tokio::test]
async fn test_delete_all_recreates_missing_collection() {
    let harness = TestHarness::new();
    let index = books(&["title"]);

    let outcome = harness.backend.delete_all_items(&index).await;

    assert_eq!(outcome, ReconciliationOutcome::Created);
    assert_eq!(harness.engine.count(Operation::DropCollection), 1);
    assert_eq!(harness.engine.count(Operation::CreateCollection), 1);
    assert_eq!(
        harness.notifier.errors(),
        vec!["Unable to delete all items in the books index.".to_string()]
    );

    let ids = harness
        .backend
        .index_items(&index, &[book("1", &[("title", "Dune")])])
        .await;
    assert_eq!(ids, vec!["1"]);
}
