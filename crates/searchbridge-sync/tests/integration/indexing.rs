//! Document batches and deletions.

use searchbridge_core::{InMemoryEngine, Operation};
use searchbridge_sync::INDEX_ERROR;

use crate::common::{TestHarness, book, books, books_collection};

fn harness() -> TestHarness {
    TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])))
}

#[tokio::test]
async fn test_partial_batch_failure_keeps_going() {
    let harness = harness();
    harness.engine.fail_document("b", "Bad Request: field `title` has an invalid type");

    let ids = harness
        .backend
        .index_items(
            &books(&["title"]),
            &[
                book("a", &[("title", "Dune")]),
                book("b", &[("title", "Emma")]),
                book("c", &[("title", "Ulysses")]),
                book("d", &[("title", "Beloved")]),
            ],
        )
        .await;

    assert_eq!(ids, vec!["a", "c", "d"]);
    assert_eq!(harness.engine.count(Operation::CreateDocument), 4);
    assert_eq!(harness.engine.documents("books").len(), 3);
    assert_eq!(harness.notifier.errors(), vec![INDEX_ERROR.to_string()]);
}

#[tokio::test]
async fn test_indexing_into_missing_collection_fails_every_item() {
    let harness = TestHarness::new();

    let ids = harness
        .backend
        .index_items(&books(&["title"]), &[book("a", &[("title", "Dune")])])
        .await;

    assert!(ids.is_empty());
    assert_eq!(harness.notifier.errors(), vec![INDEX_ERROR.to_string()]);
}

#[tokio::test]
async fn test_delete_items_removes_only_listed_ids() {
    let harness = harness();
    let index = books(&["title"]);
    harness
        .backend
        .index_items(
            &index,
            &[
                book("a", &[("title", "Dune")]),
                book("b", &[("title", "Emma")]),
                book("c", &[("title", "Ulysses")]),
            ],
        )
        .await;

    let deleted = harness
        .backend
        .delete_items(&index, &["a".to_string(), "c".to_string()])
        .await;

    assert_eq!(deleted, 2);
    let remaining = harness.engine.documents("books");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), Some("b"));
}
