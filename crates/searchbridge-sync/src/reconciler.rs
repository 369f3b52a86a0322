//! Collection reconciliation: the index lifecycle hooks.
//!
//! Per index the states are:
//!
//! | State | Action |
//! |-------|--------|
//! | no fields or no schema processor | nothing, [`SkipReason::NoSchema`] |
//! | schema, no collection | create it |
//! | schema, collection present | nothing under [`DriftPolicy::Presence`]; drop and create on a field mismatch under [`DriftPolicy::Strict`] |
//!
//! A collection's schema cannot change in place, so an index update that
//! touches its fields queues a full reindex and rebuilds the collection.
//! Every failure is logged, shown to the user, and ends the hook with
//! [`ReconciliationOutcome::Failed`], except a failed drop in
//! [`delete_all_items`](TypesenseBackend::delete_all_items), after which the
//! collection is still reconciled. Nothing is retried.

use searchbridge_core::schema::live_drift;
use searchbridge_core::{
    AccessMode, CollectionSchema, DriftPolicy, Error, Index, ReconciliationOutcome, Result,
    SchemaDerivation, SkipReason, derive_or_bootstrap, derive_schema, index_fields_updated,
};

use crate::backend::{Access, TypesenseBackend};

/// Notice shown when reconciling the server's indexes fails.
pub const SYNC_ERROR: &str = "Unable to sync index schema and Typesense schema.";

impl TypesenseBackend {
    /// Index created on the host.
    ///
    /// A field-less index gets identity fields bootstrapped onto it and is
    /// reported as [`ReconciliationOutcome::Bootstrapped`]; its collection is
    /// created later, once the schema processor declares fields. An index
    /// that already has a schema gets its collection created right away.
    pub async fn add_index(&self, index: &mut Index) -> ReconciliationOutcome {
        let notice = format!("Unable to add the index {}.", index.label);

        match derive_or_bootstrap(index, self.host(), self.notifier()) {
            Ok(SchemaDerivation::Bootstrapped(schema)) => {
                ReconciliationOutcome::Bootstrapped(schema)
            }
            Ok(SchemaDerivation::Derived(schema)) => {
                let access = match self.require_full_access() {
                    Ok(access) => access,
                    Err(skipped) => return skipped,
                };
                match self.ensure_collection(&access, &index.id, &schema).await {
                    Ok(outcome) => outcome,
                    Err(e) => self.fail(&notice, &e),
                }
            }
            Err(e) if e.is_schema_unavailable() => no_schema(&e),
            Err(e) => self.fail(&notice, &e),
        }
    }

    /// Index updated on the host.
    ///
    /// When [`index_fields_updated`] reports a change the index is queued for
    /// reindexing and its collection is dropped (if present) and created from
    /// the new schema.
    pub async fn update_index(&self, index: &Index) -> ReconciliationOutcome {
        if !index_fields_updated(index) {
            log::debug!("Index '{}' updated without field changes", index.id);
            return ReconciliationOutcome::Skipped(SkipReason::NoFieldChanges);
        }

        self.host().mark_for_reindex(&index.id);

        let schema = match derive_schema(index) {
            Ok(schema) => schema,
            Err(e) => return no_schema(&e),
        };

        let access = match self.require_full_access() {
            Ok(access) => access,
            Err(skipped) => return skipped,
        };

        match self.rebuild_collection(&access, &schema).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(&format!("Unable to update index {}.", schema.name), &e),
        }
    }

    /// Index removed on the host: drop its collection.
    pub async fn remove_index(&self, index: &Index) -> ReconciliationOutcome {
        self.drop_collection(&index.collection_name(), &index.id)
            .await
    }

    /// Drop one collection by name.
    pub async fn drop_collection(&self, collection: &str, index_id: &str) -> ReconciliationOutcome {
        let Some(write) = self.credentials(AccessMode::ReadWrite) else {
            return ReconciliationOutcome::Skipped(SkipReason::NotConfigured);
        };

        match self.engine().drop_collection(&write, collection).await {
            Ok(()) => {
                log::info!("Dropped Typesense collection '{collection}'");
                ReconciliationOutcome::Dropped
            }
            Err(e) => self.fail(&format!("Unable to remove index {index_id}."), &e),
        }
    }

    /// Remove every document of an index by dropping and recreating its collection.
    ///
    /// Issues exactly one drop and at most one create. A failed drop is
    /// reported and the collection is still reconciled, so a missing
    /// collection gets created. When the index has no schema the collection
    /// stays dropped.
    pub async fn delete_all_items(&self, index: &Index) -> ReconciliationOutcome {
        let access = match self.require_full_access() {
            Ok(access) => access,
            Err(skipped) => return skipped,
        };

        let notice = format!("Unable to delete all items in the {} index.", index.id);
        let dropped = self
            .engine()
            .drop_collection(&access.write, &index.collection_name())
            .await;
        if let Err(e) = &dropped {
            log::error!("{e}");
            self.notifier().error(&notice);
        }

        match (self.reconcile(&access, index).await, dropped) {
            (Ok(ReconciliationOutcome::Created), Ok(())) => ReconciliationOutcome::Recreated,
            (
                Ok(
                    outcome @ (ReconciliationOutcome::Created | ReconciliationOutcome::Recreated),
                ),
                _,
            ) => outcome,
            (Ok(_), Ok(())) => ReconciliationOutcome::Dropped,
            (Ok(_), Err(e)) => ReconciliationOutcome::Failed(e.to_string()),
            (Err(e), Ok(())) => self.fail(&notice, &e),
            (Err(e), Err(_)) => {
                log::error!("{e}");
                ReconciliationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Make sure every index with a schema has its collection.
    ///
    /// Indexes are reconciled independently: one without a schema, or one
    /// whose engine calls fail, does not stop the others.
    pub async fn sync_indexes_and_collections(
        &self,
        indexes: &[Index],
    ) -> Vec<(String, ReconciliationOutcome)> {
        let mut outcomes = Vec::with_capacity(indexes.len());

        for index in indexes {
            let outcome = match self.require_full_access() {
                Ok(access) => match self.reconcile(&access, index).await {
                    Ok(outcome) => outcome,
                    Err(e) => self.fail(SYNC_ERROR, &e),
                },
                Err(skipped) => skipped,
            };
            log::debug!("Index '{}': {outcome}", index.id);
            outcomes.push((index.id.clone(), outcome));
        }

        outcomes
    }

    // ========================================================================
    // Steps
    // ========================================================================

    /// Derive the schema and bring the collection in line with it.
    async fn reconcile(&self, access: &Access, index: &Index) -> Result<ReconciliationOutcome> {
        match derive_schema(index) {
            Ok(schema) => self.ensure_collection(access, &index.id, &schema).await,
            Err(e) if e.is_schema_unavailable() => Ok(no_schema(&e)),
            Err(e) => Err(e),
        }
    }

    /// Create the collection if absent; under strict drift, rebuild it on mismatch.
    async fn ensure_collection(
        &self,
        access: &Access,
        index_id: &str,
        schema: &CollectionSchema,
    ) -> Result<ReconciliationOutcome> {
        let live = self
            .engine()
            .retrieve_collection(&access.read, &schema.name)
            .await?;

        let Some(live) = live else {
            self.engine().create_collection(&access.write, schema).await?;
            log::info!("Created Typesense collection '{}'", schema.name);
            return Ok(ReconciliationOutcome::Created);
        };

        if self.drift_policy() == DriftPolicy::Strict
            && let Some(drift) = live_drift(schema, &live)
        {
            log::warn!("Collection '{}' drifted: {drift}", schema.name);
            self.host().mark_for_reindex(index_id);
            self.engine()
                .drop_collection(&access.write, &schema.name)
                .await?;
            self.engine().create_collection(&access.write, schema).await?;
            return Ok(ReconciliationOutcome::Recreated);
        }

        Ok(ReconciliationOutcome::Unchanged)
    }

    /// Drop the collection if present, then create it from `schema`.
    async fn rebuild_collection(
        &self,
        access: &Access,
        schema: &CollectionSchema,
    ) -> Result<ReconciliationOutcome> {
        let existed = self
            .engine()
            .retrieve_collection(&access.read, &schema.name)
            .await?
            .is_some();

        if existed {
            self.engine()
                .drop_collection(&access.write, &schema.name)
                .await?;
        }
        self.engine().create_collection(&access.write, schema).await?;

        log::info!(
            "{} Typesense collection '{}'",
            if existed { "Recreated" } else { "Created" },
            schema.name
        );
        Ok(if existed {
            ReconciliationOutcome::Recreated
        } else {
            ReconciliationOutcome::Created
        })
    }
}

fn no_schema(error: &Error) -> ReconciliationOutcome {
    let reason = match error {
        Error::SchemaUnavailable { reason, .. } => reason.clone(),
        other => other.to_string(),
    };
    log::debug!("{error}");
    ReconciliationOutcome::Skipped(SkipReason::NoSchema(reason))
}

// ============================================================================
// Tests
// ============================================================================
