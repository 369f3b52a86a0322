//! Searchbridge CLI: argument parsing and command handlers for the
//! `searchbridge` binary.
//!
//! # Modules
//!
//! - [`cli`]: clap definitions
//! - [`commands`]: one handler per subcommand

#![doc = include_str!("../README.md")]

pub mod cli;
pub mod commands;

pub use cli::{Args, Command, ConfigAction};
