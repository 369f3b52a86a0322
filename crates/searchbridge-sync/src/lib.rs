//! Searchbridge Sync: the lifecycle hooks that keep Typesense collections in
//! step with a host's search indexes.
//!
//! # Modules
//!
//! - [`backend`]: [`TypesenseBackend`], credentials and shared plumbing
//! - [`connection`]: observable connection state
//! - [`reconciler`]: collection create, recreate and drop hooks
//! - [`indexer`]: document submission and deletion
//! - [`status`]: availability probe and status report

#![doc = include_str!("../README.md")]

pub mod backend;
pub mod connection;
pub mod indexer;
pub mod reconciler;
pub mod status;

pub use backend::{SERVER_INFO_ERROR, TypesenseBackend};
pub use connection::{ConnectionHandle, ConnectionState};
pub use indexer::{INDEX_ERROR, build_document};
pub use reconciler::SYNC_ERROR;
pub use status::{StatusEntry, StatusInfo, StatusLevel, StatusReport};
