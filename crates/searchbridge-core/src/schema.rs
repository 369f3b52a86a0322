//! Schema derivation and change detection.
//!
//! The remote engine needs a complete schema before a collection can exist,
//! while a host index may exist long before its fields are known. This module
//! turns an [`Index`] into a [`CollectionSchema`] when that is possible, and
//! reports [`Error::SchemaUnavailable`] when it is not.
//!
//! # Bootstrapping
//!
//! An index with no fields at all gets one identity field per data source
//! entity type: a non-faceted, indexed `string` named `<entity type>_uuid`
//! bound to the `uuid` property. The fields are written back onto the index and persisted
//! through the host once. The schema processor still has to be configured
//! before a collection can be created from the derived schema.

use crate::error::{Error, Result};
use crate::host::{DataSource, FieldDescriptor, Index, IndexHost};
use crate::notice::Notifier;
use crate::types::{CollectionSchema, FieldSchema, FieldType, HOST_TYPE_PREFIX, ID_FIELD, LiveCollection};

/// Property identity fields are bound to.
pub const IDENTITY_PROPERTY: &str = "uuid";

/// Notice emitted after identity fields were bootstrapped.
pub const BOOTSTRAP_NOTICE: &str = "Default index field UUID provided for all selected datasources. \
     Please proceed to add more fields to the index and update the Typesense schema on the Processors tab.";

/// Result of [`derive_or_bootstrap`].
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDerivation {
    /// The configured schema.
    Derived(CollectionSchema),
    /// Identity fields were just synthesized; the schema processor is not configured yet.
    Bootstrapped(CollectionSchema),
}

impl SchemaDerivation {
    /// The schema either way.
    pub fn schema(&self) -> &CollectionSchema {
        match self {
            SchemaDerivation::Derived(s) | SchemaDerivation::Bootstrapped(s) => s,
        }
    }
}

/// Derive the collection schema from an index's schema processor.
///
/// Fails with [`Error::SchemaUnavailable`] when the index has no fields, no
/// schema processor, or a schema processor that declares no fields.
pub fn derive_schema(index: &Index) -> Result<CollectionSchema> {
    if index.fields.is_empty() {
        return Err(Error::schema_unavailable(&index.id, "index has no fields"));
    }

    let config = index
        .schema_config()
        .ok_or_else(|| Error::schema_unavailable(&index.id, "no schema processor configured"))?;

    if config.fields.is_empty() {
        return Err(Error::schema_unavailable(
            &index.id,
            "schema processor declares no fields",
        ));
    }

    Ok(CollectionSchema::new(index.collection_name(), config.fields))
}

/// Derive the schema, bootstrapping identity fields onto a field-less index.
pub fn derive_or_bootstrap(
    index: &mut Index,
    host: &dyn IndexHost,
    notifier: &dyn Notifier,
) -> Result<SchemaDerivation> {
    if !index.fields.is_empty() {
        return derive_schema(index).map(SchemaDerivation::Derived);
    }

    if index.datasources.is_empty() {
        return Err(Error::schema_unavailable(
            &index.id,
            "index has no fields and no data sources",
        ));
    }

    let fields = bootstrap_identity_fields(index);
    host.save_index(index)?;
    notifier.status(BOOTSTRAP_NOTICE);

    log::info!(
        "Bootstrapped {} identity field(s) onto index '{}'",
        fields.len(),
        index.id
    );

    Ok(SchemaDerivation::Bootstrapped(CollectionSchema::new(
        index.collection_name(),
        fields,
    )))
}

/// Add one identity field per entity type to the index and return their schema entries.
///
/// Data sources sharing an entity type share one field; the first data
/// source in declaration order owns it.
pub fn bootstrap_identity_fields(index: &mut Index) -> Vec<FieldSchema> {
    let datasources = index.datasources.clone();
    let mut fields: Vec<FieldSchema> = Vec::with_capacity(datasources.len());

    for ds in &datasources {
        let name = identity_field_name(ds);
        if fields.iter().any(|f| f.name == name) {
            log::debug!(
                "Data source '{}' shares identity field '{name}'",
                ds.plugin_id
            );
            continue;
        }
        index.add_field(identity_descriptor(ds));
        fields.push(FieldSchema::new(name, FieldType::String));
    }

    fields
}

/// Name of a data source's identity field.
pub fn identity_field_name(datasource: &DataSource) -> String {
    format!("{}_uuid", datasource.entity_type)
}

fn identity_descriptor(datasource: &DataSource) -> FieldDescriptor {
    FieldDescriptor {
        name: identity_field_name(datasource),
        field_type: format!("{HOST_TYPE_PREFIX}{}", FieldType::String),
        label: Some("UUID".to_string()),
        property_path: Some(IDENTITY_PROPERTY.to_string()),
        datasource_id: Some(datasource.plugin_id.clone()),
    }
}

// ============================================================================
// Change detection
// ============================================================================

/// Whether an index update changed anything the collection schema depends on.
///
/// Compares the index against its pre-update snapshot:
/// - no snapshot: changed
/// - no fields before or after: unchanged
/// - field-name sets differ: changed
/// - no schema field configuration before or after: unchanged
/// - ordered schema field names differ: changed
/// - any field's stored configuration differs as serialized text, key order
///   included: changed
pub fn index_fields_updated(index: &Index) -> bool {
    let Some(original) = index.original.as_deref() else {
        return true;
    };

    if original.fields.is_empty() && index.fields.is_empty() {
        return false;
    }

    if original.field_names() != index.field_names() {
        return true;
    }

    let old_config = original.schema_field_configs();
    let new_config = index.schema_field_configs();

    if old_config.is_empty() && new_config.is_empty() {
        return false;
    }

    let old_names: Vec<&str> = old_config.iter().map(|(n, _)| n.as_str()).collect();
    let new_names: Vec<&str> = new_config.iter().map(|(n, _)| n.as_str()).collect();
    if old_names != new_names {
        return true;
    }

    old_config
        .iter()
        .zip(new_config.iter())
        .any(|((_, old), (_, new))| old.to_string() != new.to_string())
}

// ============================================================================
// Live drift
// ============================================================================

/// Describe how a live collection's fields differ from the desired schema.
///
/// Only name and type are compared, in declared order. The engine's implicit
/// `id` and wildcard entries are ignored. Returns `None` when they agree or
/// when the engine did not report any fields.
pub fn live_drift(desired: &CollectionSchema, live: &LiveCollection) -> Option<String> {
    let live_fields: Vec<(&str, &str)> = live
        .fields
        .iter()
        .filter(|f| f.name != ID_FIELD && !f.name.contains('*'))
        .map(|f| (f.name.as_str(), f.field_type.as_str()))
        .collect();

    if live_fields.is_empty() {
        return None;
    }

    let desired_fields: Vec<(&str, &str)> = desired
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.field_type.as_str()))
        .collect();

    if live_fields == desired_fields {
        return None;
    }

    Some(format!(
        "live fields {} differ from desired {}",
        render(&live_fields),
        render(&desired_fields)
    ))
}

fn render(fields: &[(&str, &str)]) -> String {
    let parts: Vec<String> = fields.iter().map(|(n, t)| format!("{n}:{t}")).collect();
    format!("[{}]", parts.join(", "))
}

// ============================================================================
// Tests
// ============================================================================
