//! Error types for the storage layer.
//!
//! Local failures are reported as [`StoreError`]; a failed local write
//! means the triggering operation did not happen and must be retried.
//! Remote failures are reported as [`RemoteError`] and are never fatal to
//! gameplay.

/// Errors from the local durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        /// The key being read or written.
        key: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record was written by a schema this build cannot read.
    #[error("key {key} has schema version {found}, this build supports up to {supported}")]
    UnsupportedSchema {
        /// The key holding the record.
        key: String,
        /// Version found in the envelope (0 when the envelope is missing).
        found: u32,
        /// Highest supported version.
        supported: u32,
    },

    /// A key contains characters the store cannot map to storage.
    #[error("invalid store key: {0}")]
    InvalidKey(String),

    /// The store refused the write (used by the in-memory store to
    /// simulate a full or read-only device).
    #[error("write rejected for key {0}")]
    WriteRejected(String),
}

/// Errors from the remote document store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The remote store is not reachable.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// The remote document could not be (de)serialized.
    #[error("remote document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No remote store is configured for this process.
    #[error("no remote store configured")]
    NotConfigured,

    /// The remote store is misconfigured.
    #[error("remote configuration error: {0}")]
    Config(String),
}
