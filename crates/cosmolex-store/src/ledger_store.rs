//! Ledger record persistence.

use std::sync::Arc;

use cosmolex_types::{InstallId, LedgerRecord};

use crate::error::StoreError;
use crate::keys::ledger_key;
use crate::kv::KeyValueStore;
use crate::record;

/// Loads and saves the [`LedgerRecord`] of one install.
#[derive(Clone)]
pub struct LedgerStore {
    kv: Arc<dyn KeyValueStore>,
    install: InstallId,
}

impl core::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("install", &self.install)
            .finish_non_exhaustive()
    }
}

impl LedgerStore {
    /// Create a ledger store for `install`.
    pub const fn new(kv: Arc<dyn KeyValueStore>, install: InstallId) -> Self {
        Self { kv, install }
    }

    /// Load the stored record, or `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be read or decoded.
    pub fn load(&self) -> Result<Option<LedgerRecord>, StoreError> {
        let key = ledger_key(self.install);
        self.kv
            .get(&key)?
            .map(|raw| record::decode(&key, &raw))
            .transpose()
    }

    /// Durably write `record`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn save(&self, record: &LedgerRecord) -> Result<(), StoreError> {
        self.kv
            .put(&ledger_key(self.install), &record::encode(record)?)
    }

    /// Remove the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the removal fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.kv.remove(&ledger_key(self.install))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[test]
    fn first_run_has_no_record() {
        let store = LedgerStore::new(Arc::new(MemoryKvStore::new()), InstallId::new());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let store = LedgerStore::new(Arc::new(MemoryKvStore::new()), InstallId::new());
        let record = LedgerRecord {
            total_stars: 31,
            total_fuel_cells: 31,
            total_crystals: 3,
            ..LedgerRecord::default()
        };
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), Some(record));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn legacy_record_loads_through_migration() {
        let kv = Arc::new(MemoryKvStore::new());
        let install = InstallId::new();
        kv.put(
            &ledger_key(install),
            r#"{"schema_version":1,"payload":{"stars":12,"words":3,"games":1}}"#,
        )
        .unwrap();
        let record = LedgerStore::new(kv, install).load().unwrap().unwrap();
        assert_eq!(record.total_stars, 12);
        assert_eq!(record.words_learned, 3);
        assert_eq!(record.games_completed, 1);
    }
}
