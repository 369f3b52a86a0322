//! Hooks running at the same time on one backend.

use searchbridge_core::{InMemoryEngine, Operation, ReconciliationOutcome};

use crate::common::{ADMIN_KEY, TestHarness, book, books, books_collection};

#[tokio::test]
async fn test_status_check_during_indexing_keeps_write_key() {
    let harness =
        TestHarness::interleaved(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title"]);
    let items = [
        book("1", &[("title", "Dune")]),
        book("2", &[("title", "Emma")]),
        book("3", &[("title", "Ulysses")]),
    ];

    let (indexed, available) = tokio::join!(
        harness.backend.index_items(&index, &items),
        harness.backend.is_available()
    );

    assert_eq!(indexed, vec!["1", "2", "3"]);
    assert!(available);
    assert!(harness.notifier.errors().is_empty());
    assert_eq!(harness.engine.documents("books").len(), 3);
    assert!(
        harness
            .engine
            .calls_with_keys()
            .iter()
            .filter(|(call, _)| call.operation() == Operation::CreateDocument)
            .all(|(_, key)| key == ADMIN_KEY)
    );
}

#[tokio::test]
async fn test_reads_during_rebuild_do_not_block_mutations() {
    let harness =
        TestHarness::interleaved(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title", "author"]).with_original(books(&["title"]));

    let (outcome, report) = tokio::join!(
        harness.backend.update_index(&index),
        harness.backend.view_settings(std::slice::from_ref(&index))
    );

    assert_eq!(outcome, ReconciliationOutcome::Recreated);
    assert!(!report.degraded);
    assert_eq!(harness.engine.collection("books").unwrap().fields.len(), 2);
}
