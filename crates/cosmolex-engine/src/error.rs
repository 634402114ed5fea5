//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and serving so
//! `main` can propagate with `?`. Remote failures are not in here: a
//! missing or unreachable remote store only degrades the engine to
//! offline mode.

use cosmolex_catalog::CatalogError;
use cosmolex_core::{ActorError, ConfigError, ProgressError};
use cosmolex_gateway::ServerError;
use cosmolex_store::StoreError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The content catalog could not be loaded or failed validation.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: CatalogError,
    },

    /// Local storage could not be opened or read.
    #[error("storage error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The progression engine could not be opened.
    #[error("progression error: {source}")]
    Progress {
        /// The underlying progression error.
        #[from]
        source: ProgressError,
    },

    /// The progression actor stopped unexpectedly.
    #[error("actor error: {source}")]
    Actor {
        /// The underlying actor error.
        #[from]
        source: ActorError,
    },

    /// The gateway failed to start or serve.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}
