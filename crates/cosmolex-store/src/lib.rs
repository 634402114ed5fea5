//! Local durable state and remote backup documents for the Cosmolex
//! progression engine.
//!
//! # Modules
//!
//! - [`kv`] -- [`KeyValueStore`] trait with file and in-memory stores.
//! - [`keys`] -- Key layout, scoped by [`cosmolex_types::InstallId`].
//! - [`record`] -- Versioned envelopes and schema migration.
//! - [`unlock_store`] -- [`UnlockStore`], the persisted unlock sets.
//! - [`ledger_store`] -- [`LedgerStore`] for the ledger record.
//! - [`install`] -- Stable per-install identifier.
//! - [`remote`] -- [`RemoteDocumentStore`] trait, in-memory store and the
//!   configured [`RemoteBackend`].
//! - [`dragonfly`] -- `Dragonfly` remote backend.
//! - [`error`] -- [`StoreError`] and [`RemoteError`].

pub mod dragonfly;
pub mod error;
pub mod install;
pub mod keys;
pub mod kv;
pub mod ledger_store;
pub mod record;
pub mod remote;
pub mod unlock_store;

// Re-export primary types at crate root.
pub use dragonfly::DragonflyRemoteStore;
pub use error::{RemoteError, StoreError};
pub use install::load_or_create_install_id;
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use ledger_store::LedgerStore;
pub use record::{CURRENT_SCHEMA_VERSION, Versioned};
pub use remote::{LazyDragonfly, MemoryRemoteStore, RemoteBackend, RemoteDocumentStore};
pub use unlock_store::UnlockStore;
