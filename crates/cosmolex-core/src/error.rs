//! Error types for the progression engine.

use cosmolex_store::StoreError;

/// Errors surfaced by progression operations.
///
/// Remote failures never appear here; they are absorbed by the sync
/// reconciler and reported through [`cosmolex_types::SyncStatus`].
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// A lesson, planet or galaxy reference is not in the catalog. Only
    /// returned in strict catalog mode.
    #[error("{kind} not found in catalog: {key}")]
    NotFound {
        /// What was looked up (`"planet"`, `"lesson"`, `"galaxy"`).
        kind: &'static str,
        /// The reference as given by the caller.
        key: String,
    },

    /// A local durable write did not complete. The call must be retried.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
