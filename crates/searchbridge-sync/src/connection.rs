//! Connection lifecycle state.
//!
//! [`ConnectionHandle`] tracks whether the backend has a usable view of the
//! server. Constructing a backend does no I/O; `connect()` and `refresh()`
//! drive the state through this handle and every clone observes the change.
//!
//! ```rust
//! use searchbridge_sync::connection::{ConnectionHandle, ConnectionState};
//!
//! let handle = ConnectionHandle::new("typesense");
//! assert_eq!(handle.state(), ConnectionState::Unconfigured);
//!
//! handle.set_state(ConnectionState::Connecting);
//! handle.set_state(ConnectionState::Connected { collections: vec![] });
//! assert!(handle.state().is_connected());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use searchbridge_core::LiveCollection;
use tokio::sync::watch;

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the backend stands with the remote server.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionState {
    /// Credentials are incomplete, or `connect()` has not run yet.
    Unconfigured,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected; carries the collections seen at the last fetch.
    Connected {
        /// Live collections at connect/refresh time.
        collections: Vec<LiveCollection>,
    },
    /// The last attempt failed; calling `connect()` again retries.
    Failed(String),
}

impl ConnectionState {
    /// Returns `true` when connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Collections from the last successful fetch, empty otherwise.
    pub fn collections(&self) -> &[LiveCollection] {
        match self {
            Self::Connected { collections } => collections,
            _ => &[],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected { collections } => {
                write!(f, "connected ({} collections)", collections.len())
            }
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// Shared, observable connection state.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<ConnectionHandleInner>,
}

struct ConnectionHandleInner {
    name: String,
    tx: watch::Sender<ConnectionState>,
}

impl ConnectionHandle {
    /// Create a handle in [`ConnectionState::Unconfigured`].
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Unconfigured);
        Self {
            inner: Arc::new(ConnectionHandleInner {
                name: name.into(),
                tx,
            }),
        }
    }

    /// Backend name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.inner.tx.borrow().clone()
    }

    /// Replace the state and notify subscribers.
    pub fn set_state(&self, state: ConnectionState) {
        log::debug!("Connection '{}' -> {state}", self.inner.name);
        self.inner.tx.send_replace(state);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.tx.subscribe()
    }

    /// Wait until connected or failed, up to `timeout`.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<Vec<LiveCollection>, String> {
        let mut rx = self.subscribe();
        let outcome = tokio::time::timeout(
            timeout,
            rx.wait_for(|s| matches!(s, ConnectionState::Connected { .. } | ConnectionState::Failed(_))),
        )
        .await;

        match outcome {
            Err(_) => Err(format!(
                "Connection '{}' not established after {timeout:?} (state: {})",
                self.inner.name,
                self.state()
            )),
            Ok(Err(_)) => Err(format!("Connection '{}' channel closed", self.inner.name)),
            Ok(Ok(state)) => match &*state {
                ConnectionState::Connected { collections } => Ok(collections.clone()),
                ConnectionState::Failed(reason) => {
                    Err(format!("Connection '{}' failed: {reason}", self.inner.name))
                }
                _ => Err(format!("Connection '{}' in unexpected state", self.inner.name)),
            },
        }
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
