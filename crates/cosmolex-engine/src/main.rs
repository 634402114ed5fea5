//! Progression engine binary for Cosmolex.
//!
//! Wires the content catalog, local storage, the progression actor, the
//! remote backup store and the gameplay gateway together, then serves
//! until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, `COSMOLEX_CONFIG`, or
//!    `cosmolex-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the content catalog (configured file or built-in starter)
//! 4. Open local storage and load or create the install id
//! 5. Open the progression engine and spawn its actor
//! 6. Choose the remote backend (`Dragonfly` when configured, otherwise
//!    offline)
//! 7. Request the session-start sync and start the periodic sync timer
//! 8. Serve the gateway

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cosmolex_catalog::{ContentCatalog, load_catalog, starter_catalog};
use cosmolex_core::config::{CatalogConfig, LoggingConfig, ProgressConfig};
use cosmolex_core::{ActorSettings, CatalogMode, ProgressionActor, ProgressionEngine, ProgressionHandle};
use cosmolex_gateway::{AppState, ServerConfig};
use cosmolex_store::{
    FileKvStore, RemoteBackend, load_or_create_install_id,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "cosmolex-config.yaml";

/// How long shutdown waits for an outstanding remote call.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the gateway fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Configuration, then logging shaped by it.
    let config_path = config_path(std::env::args().nth(1), std::env::var("COSMOLEX_CONFIG").ok());
    let config = load_config(&config_path)?;
    init_tracing(&config.logging);

    info!(config = %config_path.display(), "cosmolex-engine starting");
    run(config).await?;
    info!("cosmolex-engine shutdown complete");
    Ok(())
}

/// Steps 3-8 of the startup sequence, then serve until shutdown.
async fn run(config: ProgressConfig) -> Result<(), EngineError> {
    info!(
        data_dir = %config.storage.data_dir.display(),
        remote = config.sync.dragonfly_url.is_some(),
        sync_interval_secs = config.sync.interval_secs,
        gateway_port = config.gateway.port,
        "Configuration loaded"
    );

    // 3. Content catalog.
    let catalog = open_catalog(&config.catalog)?;
    info!(
        galaxies = catalog.galaxies().len(),
        planets = catalog.planets().len(),
        strict = config.catalog.strict,
        "Catalog loaded"
    );

    // 4. Local storage.
    let kv = Arc::new(FileKvStore::open(&config.storage.data_dir)?);
    let install = load_or_create_install_id(kv.as_ref())?;
    info!(%install, "Install identified");

    // 5. Engine.
    let engine = ProgressionEngine::open(
        catalog,
        kv,
        install,
        CatalogMode::from_strict(config.catalog.strict),
    )?;

    // 6. Remote backend and actor.
    let remote = connect_remote(config.sync.dragonfly_url.as_deref()).await;
    let settings = ActorSettings {
        push_on_change: config.sync.push_on_change,
        ..ActorSettings::default()
    };
    let (handle, actor_task) = ProgressionActor::spawn(engine, Arc::new(remote), settings);

    let app_state = Arc::new(AppState::new(handle.clone(), config.gateway.allow_reset));
    handle
        .register_listener(Box::new(app_state.listener()))
        .await?;

    // 7. Session-start sync and periodic timer.
    handle.request_sync().await?;
    let timer = spawn_sync_timer(handle.clone(), config.sync.interval_secs);

    // 8. Serve until Ctrl-C.
    let server_config = ServerConfig::from(&config.gateway);
    let served = cosmolex_gateway::start_server(&server_config, app_state, shutdown_signal()).await;

    if let Some(timer) = timer {
        timer.abort();
    }
    drop(handle);
    if tokio::time::timeout(SHUTDOWN_GRACE, actor_task).await.is_err() {
        warn!("Progression actor did not stop in time");
    }

    Ok(served?)
}

/// Pick the config file: CLI argument, then environment, then default.
fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration, falling back to defaults (plus environment
/// overrides) when the file does not exist.
fn load_config(path: &Path) -> Result<ProgressConfig, EngineError> {
    if path.exists() {
        Ok(ProgressConfig::from_file(path)?)
    } else {
        let mut config = ProgressConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_catalog(config: &CatalogConfig) -> Result<Arc<dyn ContentCatalog>, EngineError> {
    let catalog = match &config.path {
        Some(path) => load_catalog(path)?,
        None => {
            info!("No catalog file configured, using the starter catalog");
            starter_catalog()?
        }
    };
    Ok(Arc::new(catalog))
}

/// Choose the remote backend and try a first connection. A `Dragonfly`
/// that is down at startup is not fatal: sync rounds report it as
/// unavailable and reconnect on later rounds.
async fn connect_remote(url: Option<&str>) -> RemoteBackend {
    let backend = RemoteBackend::from_url(url);
    match &backend {
        RemoteBackend::Offline => info!("No remote configured, sync status will report it"),
        RemoteBackend::Dragonfly(lazy) => {
            if let Err(e) = lazy.connection().await {
                warn!(error = %e, "Dragonfly unreachable at startup, retrying on each sync");
            }
        }
    }
    backend
}

/// Request a sync every `interval_secs`. Zero disables the timer.
fn spawn_sync_timer(handle: ProgressionHandle, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Periodic sync disabled");
        return None;
    }
    let period = Duration::from_secs(interval_secs);
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick fires immediately; the session-start sync covers it.
        interval.tick().await;
        loop {
            interval.tick().await;
            if handle.request_sync().await.is_err() {
                break;
            }
        }
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
