//! Handler functions for CLI commands.
//!
//! Config handlers work on files only. Every other handler takes a ready
//! [`TypesenseBackend`], so the same code runs against the HTTP client and
//! the in-memory engine.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use searchbridge_client::TypesenseClient;
use searchbridge_core::notice::NoticeLevel;
use searchbridge_core::{
    AccessMode, BridgeConfig, EngineClient, Error, InMemoryEngine, InMemoryHost, Index,
    ReconciliationOutcome, RecordingNotifier, Result, ServerAuth,
};
use searchbridge_sync::{StatusReport, TypesenseBackend};

use crate::cli::{Args, Command, ConfigAction};

// ============================================================================
// Dispatch
// ============================================================================

/// Run one parsed command line.
pub async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config_path = args.config.as_deref();

    if let Command::Config { action } = &args.command {
        match action {
            ConfigAction::Path => cmd_config_path(config_path)?,
            ConfigAction::Init { force } => cmd_config_init(config_path, *force)?,
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = BridgeConfig::load(config_path)?;
    let notifier = Arc::new(RecordingNotifier::new());

    let code = match args.command {
        Command::Config { .. } => ExitCode::SUCCESS,
        Command::Available => {
            let backend = backend(config, Arc::new(TypesenseClient::new()), notifier.clone());
            exit_code(cmd_available(&backend).await)
        }
        Command::Status { indexes } => {
            let indexes = match indexes_path(indexes, &config) {
                Some(path) => load_indexes(&path)?,
                None => Vec::new(),
            };
            let backend = backend(config, Arc::new(TypesenseClient::new()), notifier.clone());
            let report = cmd_status(&backend, &indexes).await;
            print!("{report}");
            exit_code(!report.degraded)
        }
        Command::Sync { indexes, dry_run } => {
            let Some(path) = indexes_path(indexes, &config) else {
                bail!("No index definitions: pass --indexes or set indexes_path in the config file");
            };
            let indexes = load_indexes(&path)?;

            let engine: Arc<dyn EngineClient> = if dry_run {
                Arc::new(
                    snapshot_engine(&config, &TypesenseClient::new())
                        .await
                        .context("Unable to read live collections for a dry run")?,
                )
            } else {
                Arc::new(TypesenseClient::new())
            };

            let backend = backend(config, engine, notifier.clone());
            let outcomes = cmd_sync(&backend, &indexes).await;
            for (index, outcome) in &outcomes {
                println!("{index}: {outcome}");
            }
            println!("{}", sync_summary(&outcomes));
            if dry_run {
                println!("(dry run: no changes were made)");
            }
            exit_code(!outcomes.iter().any(|(_, o)| o.is_failure()))
        }
        Command::Drop { collection } => {
            let backend = backend(config, Arc::new(TypesenseClient::new()), notifier.clone());
            let outcome = backend.drop_collection(&collection, &collection).await;
            println!("{collection}: {outcome}");
            exit_code(matches!(outcome, ReconciliationOutcome::Dropped))
        }
    };

    print_notices(&notifier);
    Ok(code)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// ============================================================================
// Config commands
// ============================================================================

/// Show the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match BridgeConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist, run `searchbridge config init` to create it)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

/// Create a starter configuration file.
pub fn cmd_config_init(config_path: Option<&str>, force: bool) -> Result<()> {
    let path = BridgeConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;

    BridgeConfig::init_file(&path, force)?;
    println!("Config file created at {}", path.display());
    Ok(())
}

// ============================================================================
// Backend commands
// ============================================================================

/// Backend over `engine`, reporting notices to `notifier`.
pub fn backend(
    config: BridgeConfig,
    engine: Arc<dyn EngineClient>,
    notifier: Arc<RecordingNotifier>,
) -> TypesenseBackend {
    TypesenseBackend::new(config, engine, notifier, Arc::new(InMemoryHost::new()))
}

/// Whether the server is operational; prints `available` or `unavailable`.
pub async fn cmd_available(backend: &TypesenseBackend) -> bool {
    let available = backend.is_available().await;
    println!("{}", if available { "available" } else { "unavailable" });
    available
}

/// Status report for `indexes`.
pub async fn cmd_status(backend: &TypesenseBackend, indexes: &[Index]) -> StatusReport {
    backend.view_settings(indexes).await
}

/// Reconcile every index against the server.
pub async fn cmd_sync(
    backend: &TypesenseBackend,
    indexes: &[Index],
) -> Vec<(String, ReconciliationOutcome)> {
    log::info!("Reconciling {} index(es)", indexes.len());
    backend.sync_indexes_and_collections(indexes).await
}

/// One-line tally of a sync run: collections written to and failures.
pub fn sync_summary(outcomes: &[(String, ReconciliationOutcome)]) -> String {
    let changed = outcomes.iter().filter(|(_, o)| o.changed_remote()).count();
    let failed = outcomes.iter().filter(|(_, o)| o.is_failure()).count();
    format!(
        "{changed} of {} collection(s) changed, {failed} failed",
        outcomes.len()
    )
}

/// In-memory copy of the live collections, read with the read-only key.
pub async fn snapshot_engine(
    config: &BridgeConfig,
    live: &dyn EngineClient,
) -> Result<InMemoryEngine> {
    let auth = ServerAuth::from_config(&config.server, AccessMode::ReadOnly)
        .ok_or_else(|| Error::config("Read-only credentials are incomplete"))?;
    let collections = live.retrieve_collections(&auth).await?;
    log::debug!("Dry run over {} live collection(s)", collections.len());

    Ok(collections
        .into_iter()
        .fold(InMemoryEngine::new(), InMemoryEngine::with_live_collection))
}

// ============================================================================
// Helpers
// ============================================================================

/// Explicit index file, else the one named in the config.
pub fn indexes_path(explicit: Option<PathBuf>, config: &BridgeConfig) -> Option<PathBuf> {
    explicit.or_else(|| config.indexes_path.clone())
}

/// Read a JSON array of index definitions.
pub fn load_indexes(path: &Path) -> Result<Vec<Index>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::parse(format!("Failed to parse {}: {e}", path.display())))
}

/// Write recorded notices to stderr.
pub fn print_notices(notifier: &RecordingNotifier) {
    for notice in notifier.notices() {
        match notice.level {
            NoticeLevel::Status => eprintln!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
