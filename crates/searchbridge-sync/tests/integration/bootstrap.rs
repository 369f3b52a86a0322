//! A field-less index gets identity fields, then waits for a schema.

use searchbridge_core::schema::BOOTSTRAP_NOTICE;
use searchbridge_core::{FieldType, Operation, ReconciliationOutcome, SkipReason};

use crate::common::{TestHarness, articles};

#[tokio::test]
async fn test_articles_bootstrap_then_no_op() {
    let harness = TestHarness::new();
    let mut index = articles();

    let outcome = harness.backend.add_index(&mut index).await;

    let ReconciliationOutcome::Bootstrapped(schema) = outcome else {
        unreachable!("expected bootstrap, got {outcome:?}");
    };
    assert_eq!(schema.name, "articles");
    assert_eq!(schema.field_names(), vec!["node_uuid"]);
    let field = schema.field("node_uuid").unwrap();
    assert_eq!(field.field_type, FieldType::String);
    assert!(field.indexed);
    assert!(!field.facet);

    // Identity field written back and persisted exactly once.
    assert_eq!(index.field_names().into_iter().collect::<Vec<_>>(), vec!["node_uuid"]);
    assert_eq!(harness.host.save_count("articles"), 1);
    assert_eq!(harness.notifier.statuses(), vec![BOOTSTRAP_NOTICE.to_string()]);
    assert_eq!(harness.engine.count(Operation::CreateCollection), 0);

    // No schema processor yet: reconciliation does nothing and reports no error.
    let outcomes = harness
        .backend
        .sync_indexes_and_collections(std::slice::from_ref(&index))
        .await;
    assert!(matches!(
        &outcomes[0].1,
        ReconciliationOutcome::Skipped(SkipReason::NoSchema(_))
    ));
    assert_eq!(harness.engine.count(Operation::CreateCollection), 0);
    assert!(harness.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_bootstrap_one_field_per_datasource() {
    let harness = TestHarness::new();
    let mut index = articles().with_datasource(searchbridge_core::DataSource::new(
        "entity:taxonomy_term",
        "taxonomy_term",
    ));

    harness.backend.add_index(&mut index).await;

    assert_eq!(
        index.field_names().into_iter().collect::<Vec<_>>(),
        vec!["node_uuid", "taxonomy_term_uuid"]
    );
    assert_eq!(harness.host.save_count("articles"), 1);
    let saved = harness.host.saved("articles").unwrap();
    assert_eq!(saved.fields.len(), 2);
}

#[tokio::test]
async fn test_bootstrapped_index_without_datasources_is_skipped() {
    let harness = TestHarness::new();
    let mut index = searchbridge_core::Index::new("empty");

    let outcome = harness.backend.add_index(&mut index).await;

    assert!(matches!(
        outcome,
        ReconciliationOutcome::Skipped(SkipReason::NoSchema(_))
    ));
    assert_eq!(harness.host.save_count("empty"), 0);
    assert!(harness.engine.calls().is_empty());
}
