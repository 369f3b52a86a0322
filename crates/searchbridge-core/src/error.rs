//! Error types for searchbridge-core.

use std::path::{Path, PathBuf};

/// Result type alias for Searchbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling or indexing.
///
/// Lifecycle hooks never let these escape: they are logged, turned into a
/// user-facing notice and folded into a
/// [`ReconciliationOutcome`](crate::outcome::ReconciliationOutcome).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Any transport, authentication or API failure raised by the remote engine.
    #[error("Remote engine error: {message}")]
    RemoteEngine {
        /// Human-readable message from the engine or transport.
        message: String,
    },

    /// The index has no fields or no schema configuration yet.
    #[error("Schema unavailable for index '{index}': {reason}")]
    SchemaUnavailable {
        /// Index identifier.
        index: String,
        /// Why no schema could be derived.
        reason: String,
    },

    /// Configuration is missing or malformed.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic.
        message: String,
    },

    /// File I/O failure, with the offending path.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file or payload could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// What went wrong.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a remote engine error.
    pub fn remote<S: Into<String>>(message: S) -> Self {
        Error::RemoteEngine {
            message: message.into(),
        }
    }

    /// Creates a schema-unavailable error for the given index.
    pub fn schema_unavailable<I, R>(index: I, reason: R) -> Self
    where
        I: Into<String>,
        R: Into<String>,
    {
        Error::SchemaUnavailable {
            index: index.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns `true` for errors raised by the remote engine collaborator.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::RemoteEngine { .. })
    }

    /// Returns `true` when no schema could be derived (a quiescent state).
    pub fn is_schema_unavailable(&self) -> bool {
        matches!(self, Error::SchemaUnavailable { .. })
    }
}
