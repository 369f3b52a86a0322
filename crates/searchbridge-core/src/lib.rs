//! Searchbridge Core: shared types, host model, normalizer and schema deriver.
//!
//! This crate has no internal Searchbridge dependencies. Everything that talks
//! to a real server lives in `searchbridge-client`; everything that drives
//! lifecycle hooks lives in `searchbridge-sync`.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Engine field types, schemas, documents and filters
//! - [`normalize`]: Raw value coercion per field type
//! - [`host`]: Host index, field, data source and item model
//! - [`schema`]: Schema derivation, bootstrapping and change detection
//! - [`config`]: Server credentials and config file handling
//! - [`engine`]: The [`EngineClient`] trait
//! - [`memory`]: [`InMemoryEngine`] for tests and dry runs
//! - [`notice`]: User-facing notices
//! - [`outcome`]: Lifecycle hook results

#![doc = include_str!("../README.md")]

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod memory;
pub mod normalize;
pub mod notice;
pub mod outcome;
pub mod schema;
pub mod types;

// Re-export key types at crate root for convenience
pub use config::{AccessMode, BridgeConfig, DriftPolicy, Node, Protocol, ServerAuth, ServerConfig, SyncConfig};
pub use engine::{DebugInfo, EngineClient, Health, Metrics};
pub use error::{Error, Result};
pub use host::{DataSource, FieldDescriptor, InMemoryHost, Index, IndexHost, Item, ItemField, SchemaConfig};
pub use memory::{EngineCall, InMemoryEngine, Operation};
pub use normalize::normalize;
pub use notice::{LogNotifier, Notifier, RecordingNotifier};
pub use outcome::{ReconciliationOutcome, SkipReason};
pub use schema::{SchemaDerivation, derive_or_bootstrap, derive_schema, index_fields_updated};
pub use types::{
    CollectionSchema, Document, DocumentFilter, FieldSchema, FieldType, LiveCollection, LiveField,
    supports_data_type,
};
