//! Searchbridge Client: the Typesense REST implementation of
//! [`EngineClient`](searchbridge_core::EngineClient).
//!
//! # Modules
//!
//! - [`client`]: [`TypesenseClient`] with node failover and key switching

#![doc = include_str!("../README.md")]

pub mod client;

pub use client::{API_KEY_HEADER, TypesenseClient, parse_metrics};
