//! Results of lifecycle hooks.

use std::fmt;

use crate::types::CollectionSchema;

/// Why a hook did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Credentials for the required access mode are incomplete.
    NotConfigured,
    /// No schema could be derived; carries the reason.
    NoSchema(String),
    /// The index update did not touch anything the schema depends on.
    NoFieldChanges,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotConfigured => f.write_str("server not configured"),
            SkipReason::NoSchema(reason) => write!(f, "no schema: {reason}"),
            SkipReason::NoFieldChanges => f.write_str("no field changes"),
        }
    }
}

/// What a lifecycle hook did to the remote collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// The collection already matched.
    Unchanged,
    /// A new collection was created.
    Created,
    /// The collection was dropped and created again.
    Recreated,
    /// The collection was dropped.
    Dropped,
    /// Identity fields were bootstrapped onto the index; no collection yet.
    Bootstrapped(CollectionSchema),
    /// The engine rejected an operation; the message was already logged and notified.
    Failed(String),
}

impl ReconciliationOutcome {
    /// Returns `true` for [`ReconciliationOutcome::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, ReconciliationOutcome::Failed(_))
    }

    /// Returns `true` when the remote collection was written to.
    pub fn changed_remote(&self) -> bool {
        matches!(
            self,
            ReconciliationOutcome::Created
                | ReconciliationOutcome::Recreated
                | ReconciliationOutcome::Dropped
        )
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationOutcome::Skipped(reason) => write!(f, "skipped ({reason})"),
            ReconciliationOutcome::Unchanged => f.write_str("unchanged"),
            ReconciliationOutcome::Created => f.write_str("created"),
            ReconciliationOutcome::Recreated => f.write_str("recreated"),
            ReconciliationOutcome::Dropped => f.write_str("dropped"),
            ReconciliationOutcome::Bootstrapped(schema) => write!(
                f,
                "bootstrapped {} identity field(s)",
                schema.fields.len()
            ),
            ReconciliationOutcome::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}
