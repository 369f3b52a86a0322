//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Searchbridge: keep Typesense collections in step with host indexes.
#[derive(Parser, Debug)]
#[command(name = "searchbridge", author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Configuration file management
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check whether the server is operational
    Available,
    /// Show collection details and server health
    Status {
        /// JSON file with index definitions
        #[arg(short, long)]
        indexes: Option<PathBuf>,
    },
    /// Create missing collections for the given indexes
    Sync {
        /// JSON file with index definitions
        #[arg(short, long)]
        indexes: Option<PathBuf>,
        /// Reconcile against an in-memory copy of the server
        #[arg(long)]
        dry_run: bool,
    },
    /// Drop one collection
    Drop {
        /// Collection name
        collection: String,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the resolved config file path
    Path,
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
