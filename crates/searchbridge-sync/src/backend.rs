//! The Typesense backend: configuration, collaborators and connection.
//!
//! A [`TypesenseBackend`] is inert when constructed. [`connect`] and
//! [`refresh`] are the only calls that fetch server state eagerly; every
//! lifecycle hook (see the `reconciler`, `indexer` and `status` modules)
//! fetches what it needs when it runs.
//!
//! Credentials are chosen per engine call: reads go out with the read-only
//! key, mutations with the read-write key. Nothing about the key in use is
//! stored on the backend or the engine, so hooks may run concurrently. A
//! missing key is not an error; the hook reports
//! [`SkipReason::NotConfigured`] instead.
//!
//! [`connect`]: TypesenseBackend::connect
//! [`refresh`]: TypesenseBackend::refresh

use std::sync::Arc;

use searchbridge_core::{
    AccessMode, BridgeConfig, DriftPolicy, EngineClient, Error, IndexHost, Notifier,
    ReconciliationOutcome, ServerAuth, SkipReason, supports_data_type,
};

use crate::connection::{ConnectionHandle, ConnectionState};

/// Notice shown when server state could not be fetched.
pub const SERVER_INFO_ERROR: &str = "Unable to retrieve server and/or index information.";

/// Read-only and read-write credentials resolved for one hook run.
#[derive(Debug, Clone)]
pub(crate) struct Access {
    pub(crate) read: ServerAuth,
    pub(crate) write: ServerAuth,
}

/// Bridge between a host index framework and a Typesense server.
pub struct TypesenseBackend {
    config: BridgeConfig,
    engine: Arc<dyn EngineClient>,
    notifier: Arc<dyn Notifier>,
    host: Arc<dyn IndexHost>,
    connection: ConnectionHandle,
}

impl TypesenseBackend {
    /// Create a backend. No I/O happens until [`connect`](Self::connect) or a hook runs.
    pub fn new(
        config: BridgeConfig,
        engine: Arc<dyn EngineClient>,
        notifier: Arc<dyn Notifier>,
        host: Arc<dyn IndexHost>,
    ) -> Self {
        let connection = ConnectionHandle::new(engine.name());
        Self {
            config,
            engine,
            notifier,
            host,
            connection,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Engine client.
    pub fn engine(&self) -> &Arc<dyn EngineClient> {
        &self.engine
    }

    /// Observable connection state.
    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Drift policy for existing collections.
    pub fn drift_policy(&self) -> DriftPolicy {
        self.config.sync.drift_policy
    }

    /// Whether a host data type is handled by this backend.
    pub fn supports_data_type(&self, host_type: &str) -> bool {
        supports_data_type(host_type)
    }

    /// Whether credentials are complete for `mode`.
    pub fn is_configured(&self, mode: AccessMode) -> bool {
        self.credentials(mode).is_some()
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Fetch the live collections with the read-only key.
    ///
    /// Incomplete credentials leave the backend [`ConnectionState::Unconfigured`];
    /// a failed fetch leaves it [`ConnectionState::Failed`] and may be retried.
    pub async fn connect(&self) -> ConnectionState {
        let Some(auth) = self.credentials(AccessMode::ReadOnly) else {
            log::debug!("Typesense credentials incomplete, not connecting");
            self.connection.set_state(ConnectionState::Unconfigured);
            return self.connection.state();
        };

        self.connection.set_state(ConnectionState::Connecting);
        self.fetch_collections(&auth).await
    }

    /// Re-fetch the live collections, keeping the last view until the fetch completes.
    pub async fn refresh(&self) -> ConnectionState {
        let Some(auth) = self.credentials(AccessMode::ReadOnly) else {
            self.connection.set_state(ConnectionState::Unconfigured);
            return self.connection.state();
        };
        self.fetch_collections(&auth).await
    }

    async fn fetch_collections(&self, auth: &ServerAuth) -> ConnectionState {
        let state = match self.engine.retrieve_collections(auth).await {
            Ok(collections) => {
                log::info!(
                    "Connected to Typesense via '{}': {} collection(s)",
                    self.engine.name(),
                    collections.len()
                );
                ConnectionState::Connected { collections }
            }
            Err(e) => {
                log::error!("{e}");
                self.notifier.error(SERVER_INFO_ERROR);
                ConnectionState::Failed(e.to_string())
            }
        };

        self.connection.set_state(state.clone());
        state
    }

    // ========================================================================
    // Shared plumbing for hooks
    // ========================================================================

    pub(crate) fn host(&self) -> &dyn IndexHost {
        self.host.as_ref()
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Credentials for `mode`; `None` when incomplete.
    pub(crate) fn credentials(&self, mode: AccessMode) -> Option<ServerAuth> {
        ServerAuth::from_config(&self.config.server, mode)
    }

    /// Both credentials, or the skip outcome when either is incomplete.
    pub(crate) fn require_full_access(
        &self,
    ) -> std::result::Result<Access, ReconciliationOutcome> {
        match (
            self.credentials(AccessMode::ReadOnly),
            self.credentials(AccessMode::ReadWrite),
        ) {
            (Some(read), Some(write)) => Ok(Access { read, write }),
            _ => {
                log::debug!("Typesense credentials incomplete, skipping");
                Err(ReconciliationOutcome::Skipped(SkipReason::NotConfigured))
            }
        }
    }

    /// Log an engine failure, show `notice`, and fold it into an outcome.
    pub(crate) fn fail(&self, notice: &str, error: &Error) -> ReconciliationOutcome {
        log::error!("{error}");
        self.notifier.error(notice);
        ReconciliationOutcome::Failed(error.to_string())
    }
}

impl std::fmt::Debug for TypesenseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypesenseBackend")
            .field("engine", &self.engine.name())
            .field("connection", &self.connection.state())
            .field("drift_policy", &self.config.sync.drift_policy)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
