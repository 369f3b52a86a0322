//! Host framework model.
//!
//! The host search framework owns indexes, their fields, their data sources,
//! and the items it hands over for indexing. Searchbridge only reads these,
//! with two exceptions: identity-field bootstrapping writes fields back onto
//! an index and asks the host to persist it, and schema changes ask the host
//! to queue a full reindex. Both go through [`IndexHost`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{FieldSchema, FieldType};

/// Processor id whose configuration carries the desired collection schema.
pub const SCHEMA_PROCESSOR: &str = "typesense_schema";

// ============================================================================
// Index model
// ============================================================================

/// Origin of indexable items (one content type, for instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Host plugin id, e.g. `entity:node`.
    pub plugin_id: String,
    /// Entity type the source yields, e.g. `node`.
    pub entity_type: String,
}

impl DataSource {
    /// Create a data source.
    pub fn new(plugin_id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// A field as the host index defines it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field machine name.
    pub name: String,
    /// Host data-type id, e.g. `typesense_string` or `integer`.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Property the value is read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_path: Option<String>,
    /// Data source the property belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource_id: Option<String>,
}

impl FieldDescriptor {
    /// Create a field with a host type.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            label: None,
            property_path: None,
            datasource_id: None,
        }
    }

    /// Engine type this field normalizes to.
    pub fn engine_type(&self) -> FieldType {
        FieldType::from_host_type(&self.field_type)
    }
}

/// Schema block of the schema processor's configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Explicit collection name; the index id is used when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared schema fields, in order.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl SchemaConfig {
    /// Schema config with fields and no explicit name.
    pub fn with_fields(fields: Vec<FieldSchema>) -> Self {
        Self { name: None, fields }
    }
}

/// A host index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// Stable identifier.
    pub id: String,
    /// Human label.
    #[serde(default)]
    pub label: String,
    /// Ordered field definitions; names are unique.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Attached data sources.
    #[serde(default)]
    pub datasources: Vec<DataSource>,
    /// Processor configuration blocks keyed by processor id.
    #[serde(default)]
    pub processors: BTreeMap<String, Value>,
    /// Snapshot of the index before the pending update, if the host kept one.
    #[serde(skip)]
    pub original: Option<Box<Index>>,
}

impl Index {
    /// Create an empty index.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            ..Default::default()
        }
    }

    /// Builder: add a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.add_field(field);
        self
    }

    /// Builder: attach a data source.
    pub fn with_datasource(mut self, datasource: DataSource) -> Self {
        self.datasources.push(datasource);
        self
    }

    /// Builder: set the schema processor configuration.
    pub fn with_schema(mut self, schema: SchemaConfig) -> Self {
        self.set_schema(schema);
        self
    }

    /// Builder: record the pre-update snapshot.
    pub fn with_original(mut self, original: Index) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    /// Add a field, replacing any field with the same name in place.
    pub fn add_field(&mut self, field: FieldDescriptor) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Set of field names.
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Raw configuration of a processor.
    pub fn processor(&self, id: &str) -> Option<&Value> {
        self.processors.get(id)
    }

    /// Replace the schema processor configuration.
    pub fn set_schema(&mut self, schema: SchemaConfig) {
        let value = serde_json::json!({ "schema": schema });
        self.processors.insert(SCHEMA_PROCESSOR.to_string(), value);
    }

    /// Typed schema processor configuration, if attached and well-formed.
    pub fn schema_config(&self) -> Option<SchemaConfig> {
        let schema = self.processor(SCHEMA_PROCESSOR)?.get("schema")?;
        match serde_json::from_value(schema.clone()) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Index '{}' has a malformed schema processor config: {e}", self.id);
                None
            }
        }
    }

    /// Raw per-field schema configuration, in declared order.
    ///
    /// Kept as raw JSON so change detection compares exactly what was stored.
    pub fn schema_field_configs(&self) -> Vec<(String, Value)> {
        self.processor(SCHEMA_PROCESSOR)
            .and_then(|p| p.pointer("/schema/fields"))
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .map(|f| {
                        let name = f.get("name").and_then(Value::as_str).unwrap_or_default();
                        (name.to_string(), f.clone())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Collection name: explicit schema name, else the index id.
    pub fn collection_name(&self) -> String {
        self.schema_config()
            .and_then(|s| s.name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.id.clone())
    }
}

// ============================================================================
// Items
// ============================================================================

/// Values of one field on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemField {
    /// Field name.
    pub name: String,
    /// Host data-type id.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Raw values; zero, one or many.
    #[serde(default)]
    pub values: Vec<Value>,
}

impl ItemField {
    /// Create an item field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            values,
        }
    }
}

/// An item handed over by the host for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item key; becomes the document `id`.
    pub id: String,
    /// Field values, in host order.
    #[serde(default)]
    pub fields: Vec<ItemField>,
}

impl Item {
    /// Create an item with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Builder: add a field.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        field_type: impl Into<String>,
        values: Vec<Value>,
    ) -> Self {
        self.fields.push(ItemField::new(name, field_type, values));
        self
    }
}

// ============================================================================
// Host callbacks
// ============================================================================

/// Side effects Searchbridge asks of the host framework.
pub trait IndexHost: Send + Sync {
    /// Persist an index whose fields were changed by bootstrapping.
    fn save_index(&self, index: &Index) -> Result<()>;

    /// Queue every item of the index for reindexing.
    fn mark_for_reindex(&self, index_id: &str);
}

/// Host that keeps saved indexes and reindex requests in memory.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    saved: RwLock<BTreeMap<String, Index>>,
    save_counts: RwLock<BTreeMap<String, usize>>,
    reindexed: Mutex<Vec<String>>,
}

impl InMemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last saved version of an index.
    pub fn saved(&self, index_id: &str) -> Option<Index> {
        self.saved.read().ok()?.get(index_id).cloned()
    }

    /// How many times an index was saved.
    pub fn save_count(&self, index_id: &str) -> usize {
        self.save_counts
            .read()
            .ok()
            .and_then(|c| c.get(index_id).copied())
            .unwrap_or(0)
    }

    /// Index ids queued for reindexing, in request order.
    pub fn reindex_requests(&self) -> Vec<String> {
        self.reindexed.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl IndexHost for InMemoryHost {
    fn save_index(&self, index: &Index) -> Result<()> {
        let mut saved = self
            .saved
            .write()
            .map_err(|_| Error::config("index store lock poisoned"))?;
        saved.insert(index.id.clone(), index.clone());

        let mut counts = self
            .save_counts
            .write()
            .map_err(|_| Error::config("index store lock poisoned"))?;
        *counts.entry(index.id.clone()).or_insert(0) += 1;
        Ok(())
    }

    fn mark_for_reindex(&self, index_id: &str) {
        if let Ok(mut reindexed) = self.reindexed.lock() {
            reindexed.push(index_id.to_string());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
