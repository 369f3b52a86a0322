//! Searchbridge: umbrella crate.
//!
//! This crate re-exports all Searchbridge components for convenience.
//! Use feature flags to enable specific functionality.

#![doc = include_str!("../README.md")]

pub use searchbridge_core as core;

#[cfg(feature = "client")]
pub use searchbridge_client as client;

#[cfg(feature = "sync")]
pub use searchbridge_sync as sync;
