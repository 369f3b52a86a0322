//! Field changes rebuild the collection.

use searchbridge_core::{
    EngineCall, InMemoryEngine, Operation, ReconciliationOutcome, SkipReason,
};

use crate::common::{TestHarness, book, books, books_collection};

#[tokio::test]
async fn test_books_field_added_recreates_and_indexes() {
    let harness =
        TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title", "author"]).with_original(books(&["title"]));

    let outcome = harness.backend.update_index(&index).await;

    assert_eq!(outcome, ReconciliationOutcome::Recreated);
    assert_eq!(harness.host.reindex_requests(), vec!["books".to_string()]);
    assert_eq!(harness.engine.count(Operation::DropCollection), 1);
    assert_eq!(harness.engine.count(Operation::CreateCollection), 1);

    let live = harness.engine.collection("books").unwrap();
    let names: Vec<&str> = live.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["title", "author"]);

    let ids = harness
        .backend
        .index_items(
            &index,
            &[
                book("1", &[("title", "Dune"), ("author", "Herbert")]),
                book("2", &[("title", "Emma"), ("author", "Austen")]),
            ],
        )
        .await;

    assert_eq!(ids, vec!["1", "2"]);
    let documents = harness.engine.documents("books");
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].get("author"), Some(&serde_json::json!("Herbert")));
    assert!(harness.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_mutations_use_admin_key() {
    let harness =
        TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title", "author"]).with_original(books(&["title"]));

    harness.backend.update_index(&index).await;

    let calls = harness.engine.calls_with_keys();
    assert_eq!(
        calls[0],
        (EngineCall::RetrieveCollection("books".into()), "ro-key".to_string())
    );
    for (call, key) in &calls[1..] {
        assert!(
            matches!(call, EngineCall::DropCollection(_) | EngineCall::CreateCollection(_)),
            "unexpected call {call:?}"
        );
        assert_eq!(key, "rw-key");
    }
    assert_eq!(calls.len(), 3);
}

#[tokio::test]
async fn test_unchanged_update_touches_nothing() {
    let harness =
        TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])));
    let index = books(&["title"]).with_original(books(&["title"]));

    let outcome = harness.backend.update_index(&index).await;

    assert_eq!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::NoFieldChanges)
    );
    assert!(harness.engine.calls().is_empty());
    assert!(harness.host.reindex_requests().is_empty());
}

#[tokio::test]
async fn test_strict_sync_rebuilds_drifted_collection() {
    let harness = TestHarness::strict(
        InMemoryEngine::new().with_collection(&books_collection(&["title"])),
    );

    let outcomes = harness
        .backend
        .sync_indexes_and_collections(&[books(&["title", "author"])])
        .await;

    assert_eq!(outcomes, vec![("books".to_string(), ReconciliationOutcome::Recreated)]);
    assert_eq!(harness.host.reindex_requests(), vec!["books".to_string()]);
}

#[tokio::test]
async fn test_presence_sync_keeps_existing_collection() {
    let harness =
        TestHarness::with_engine(InMemoryEngine::new().with_collection(&books_collection(&["title"])));

    let outcomes = harness
        .backend
        .sync_indexes_and_collections(&[books(&["title", "author"])])
        .await;

    assert_eq!(outcomes, vec![("books".to_string(), ReconciliationOutcome::Unchanged)]);
    assert_eq!(harness.engine.count(Operation::DropCollection), 0);
}
