//! Engine-side schema and document types.
//!
//! These mirror the shapes the Typesense API accepts and returns:
//!
//! - [`FieldType`]: the closed set of field types the bridge can emit
//! - [`FieldSchema`] / [`CollectionSchema`]: the desired collection schema
//! - [`LiveCollection`]: a collection as reported by the engine
//! - [`Document`]: one normalized record, always keyed by `id`
//! - [`DocumentFilter`]: a `field:[values]` filter for bulk deletes

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host data-type ids owned by this bridge start with this prefix.
pub const HOST_TYPE_PREFIX: &str = "typesense_";

// ============================================================================
// FieldType
// ============================================================================

/// Field type understood by the remote engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldType {
    /// Let the engine detect the type.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Boolean.
    #[serde(rename = "bool")]
    Bool,
    /// IEEE-754 double.
    #[serde(rename = "float")]
    Float,
    /// 32-bit integer.
    #[serde(rename = "int32")]
    Int32,
    /// UTF-8 string.
    #[serde(rename = "string")]
    String,
    /// Array of booleans.
    #[serde(rename = "bool[]")]
    BoolArray,
    /// Array of doubles.
    #[serde(rename = "float[]")]
    FloatArray,
    /// Array of 32-bit integers.
    #[serde(rename = "int32[]")]
    Int32Array,
    /// Array of strings.
    #[serde(rename = "string[]")]
    StringArray,
}

impl FieldType {
    /// Engine name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Auto => "auto",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::String => "string",
            FieldType::BoolArray => "bool[]",
            FieldType::FloatArray => "float[]",
            FieldType::Int32Array => "int32[]",
            FieldType::StringArray => "string[]",
        }
    }

    /// Parse an engine type name.
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name {
            "auto" => FieldType::Auto,
            "bool" => FieldType::Bool,
            "float" => FieldType::Float,
            "int32" => FieldType::Int32,
            "string" => FieldType::String,
            "bool[]" => FieldType::BoolArray,
            "float[]" => FieldType::FloatArray,
            "int32[]" => FieldType::Int32Array,
            "string[]" => FieldType::StringArray,
            _ => return None,
        };
        Some(ty)
    }

    /// Map a host data-type id onto the closed set.
    ///
    /// `typesense_<t>` ids map to `<t>`; the host's generic types map to their
    /// nearest engine type; anything unknown falls back to [`FieldType::Auto`].
    pub fn from_host_type(host_type: &str) -> Self {
        if let Some(engine) = host_type.strip_prefix(HOST_TYPE_PREFIX) {
            return Self::parse(engine).unwrap_or(FieldType::Auto);
        }

        match host_type {
            "boolean" => FieldType::Bool,
            "decimal" => FieldType::Float,
            "integer" | "date" => FieldType::Int32,
            "string" | "text" => FieldType::String,
            _ => FieldType::Auto,
        }
    }

    /// Element type for array types, `None` for scalars.
    pub fn element(&self) -> Option<FieldType> {
        match self {
            FieldType::BoolArray => Some(FieldType::Bool),
            FieldType::FloatArray => Some(FieldType::Float),
            FieldType::Int32Array => Some(FieldType::Int32),
            FieldType::StringArray => Some(FieldType::String),
            _ => None,
        }
    }

    /// Returns `true` for array types.
    pub fn is_array(&self) -> bool {
        self.element().is_some()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a host data type is handled by this bridge.
pub fn supports_data_type(host_type: &str) -> bool {
    host_type.starts_with(HOST_TYPE_PREFIX)
}

// ============================================================================
// Schema
// ============================================================================

/// One field of a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name.
    pub name: String,

    /// Engine type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Enable faceting on this field.
    #[serde(default)]
    pub facet: bool,

    /// Documents may omit this field.
    #[serde(default)]
    pub optional: bool,

    /// Field is indexed (searchable/filterable).
    #[serde(rename = "index", default = "default_true")]
    pub indexed: bool,

    /// Field is sortable.
    #[serde(rename = "sort", default)]
    pub sortable: bool,

    /// Enable infix search.
    #[serde(default)]
    pub infix: bool,

    /// Locale for tokenization; empty means the engine default.
    #[serde(default)]
    pub locale: String,
}

fn default_true() -> bool {
    true
}

impl FieldSchema {
    /// A plain indexed field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            facet: false,
            optional: false,
            indexed: true,
            sortable: false,
            infix: false,
            locale: String::new(),
        }
    }

    /// Set the facet flag.
    pub fn with_facet(mut self, facet: bool) -> Self {
        self.facet = facet;
        self
    }

    /// Set the optional flag.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set the sort flag.
    pub fn with_sort(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }
}

/// Desired schema of a remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name, unique per server.
    pub name: String,
    /// Ordered field list; must be non-empty before creation.
    pub fields: Vec<FieldSchema>,
}

impl CollectionSchema {
    /// Create a schema.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Ordered field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A collection can only be created from a schema with fields.
    pub fn is_creatable(&self) -> bool {
        !self.name.is_empty() && !self.fields.is_empty()
    }
}

// ============================================================================
// Live collection
// ============================================================================

/// A field as reported back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveField {
    /// Field name (may be a pattern such as `.*`).
    pub name: String,
    /// Engine type name, kept raw since the engine knows more types than we emit.
    #[serde(rename = "type")]
    pub field_type: String,
}

/// A collection as it currently exists on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveCollection {
    /// Collection name.
    pub name: String,
    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    /// Number of stored documents.
    #[serde(default)]
    pub num_documents: u64,
    /// Field list as created, when the engine reports it.
    #[serde(default)]
    pub fields: Vec<LiveField>,
}

impl LiveCollection {
    /// Build the live view the engine would report right after creation.
    pub fn from_schema(schema: &CollectionSchema, created_at: i64) -> Self {
        Self {
            name: schema.name.clone(),
            created_at,
            num_documents: 0,
            fields: schema
                .fields
                .iter()
                .map(|f| LiveField {
                    name: f.name.clone(),
                    field_type: f.field_type.as_str().to_string(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Name of the mandatory document key field.
pub const ID_FIELD: &str = "id";

/// A normalized document ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Start a document seeded with its `id`.
    pub fn new(id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(ID_FIELD.to_string(), Value::String(id.into()));
        Self(map)
    }

    /// The document key.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Attach a normalized value under a field name.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Read a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Number of fields, `id` included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` in practice since `id` is seeded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Filter selecting documents whose `field` matches any of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Field to match on.
    pub field: String,
    /// Accepted values.
    pub values: Vec<String>,
}

impl DocumentFilter {
    /// Filter on the `id` field.
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: ID_FIELD.to_string(),
            values: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Render as a Typesense `filter_by` expression, backtick-quoting values.
    pub fn to_filter_by(&self) -> String {
        let values: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("`{}`", v.replace('`', "")))
            .collect();
        format!("{}:[{}]", self.field, values.join(","))
    }

    /// Whether a document key is selected by this filter.
    pub fn matches(&self, document: &Document) -> bool {
        document
            .get(&self.field)
            .map(|v| match v {
                Value::String(s) => self.values.iter().any(|x| x == s),
                other => self.values.iter().any(|x| *x == other.to_string()),
            })
            .unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_serialization() {
        assert_eq!(serde_json::to_string(&FieldType::Int32).unwrap(), "\"int32\"");
        assert_eq!(
            serde_json::to_string(&FieldType::StringArray).unwrap(),
            "\"string[]\""
        );
        let ty: FieldType = serde_json::from_str("\"float[]\"").unwrap();
        assert_eq!(ty, FieldType::FloatArray);
    }

    #[test]
    fn test_field_type_parse_matches_as_str() {
        for ty in [
            FieldType::Auto,
            FieldType::Bool,
            FieldType::Float,
            FieldType::Int32,
            FieldType::String,
            FieldType::BoolArray,
            FieldType::FloatArray,
            FieldType::Int32Array,
            FieldType::StringArray,
        ] {
            assert_eq!(FieldType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(FieldType::parse("geopoint"), None);
    }

    #[test]
    fn test_from_host_type() {
        assert_eq!(FieldType::from_host_type("typesense_string"), FieldType::String);
        assert_eq!(FieldType::from_host_type("typesense_int32"), FieldType::Int32);
        assert_eq!(FieldType::from_host_type("typesense_bogus"), FieldType::Auto);
        assert_eq!(FieldType::from_host_type("boolean"), FieldType::Bool);
        assert_eq!(FieldType::from_host_type("decimal"), FieldType::Float);
        assert_eq!(FieldType::from_host_type("integer"), FieldType::Int32);
        assert_eq!(FieldType::from_host_type("text"), FieldType::String);
        assert_eq!(FieldType::from_host_type("location"), FieldType::Auto);
    }

    #[test]
    fn test_supports_data_type() {
        assert!(supports_data_type("typesense_bool"));
        assert!(!supports_data_type("boolean"));
    }

    #[test]
    fn test_field_schema_wire_names() {
        let field = FieldSchema::new("title", FieldType::String).with_sort(true);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "string");
        assert_eq!(json["index"], true);
        assert_eq!(json["sort"], true);
        assert_eq!(json["locale"], "");
    }

    #[test]
    fn test_field_schema_defaults_on_deserialize() {
        let field: FieldSchema =
            serde_json::from_value(json!({"name": "title", "type": "string"})).unwrap();
        assert!(field.indexed);
        assert!(!field.facet);
        assert!(!field.sortable);
    }

    #[test]
    fn test_collection_schema_creatable() {
        let empty = CollectionSchema::new("books", vec![]);
        assert!(!empty.is_creatable());

        let schema = CollectionSchema::new("books", vec![FieldSchema::new("title", FieldType::String)]);
        assert!(schema.is_creatable());
        assert_eq!(schema.field_names(), vec!["title"]);
        assert!(schema.field("title").is_some());
    }

    #[test]
    fn test_live_collection_ignores_unknown_keys() {
        let live: LiveCollection = serde_json::from_value(json!({
            "name": "books",
            "created_at": 1700000000,
            "num_documents": 12,
            "fields": [{"name": "title", "type": "string", "facet": false, "stem": false}],
            "token_separators": []
        }))
        .unwrap();
        assert_eq!(live.num_documents, 12);
        assert_eq!(live.fields[0].field_type, "string");
    }

    #[test]
    fn test_document_seeded_with_id() {
        let mut doc = Document::new("node:1");
        doc.insert("title", json!("Dune"));
        assert_eq!(doc.id(), Some("node:1"));
        assert_eq!(doc.len(), 2);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"id": "node:1", "title": "Dune"})
        );
    }

    #[test]
    fn test_filter_by_rendering() {
        let filter = DocumentFilter::ids(["a", "b`c"]);
        assert_eq!(filter.to_filter_by(), "id:[`a`,`bc`]");
    }

    #[test]
    fn test_filter_matches() {
        let filter = DocumentFilter::ids(["1", "2"]);
        assert!(filter.matches(&Document::new("1")));
        assert!(!filter.matches(&Document::new("3")));
    }
}
