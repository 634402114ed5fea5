//! Stable per-install identifier.

use cosmolex_types::InstallId;

use crate::error::StoreError;
use crate::keys::INSTALL_ID_KEY;
use crate::kv::KeyValueStore;
use crate::record;

/// Return the stored install id, creating and persisting one on first run.
///
/// # Errors
///
/// Returns [`StoreError`] if the id cannot be read, decoded or written.
pub fn load_or_create_install_id(kv: &dyn KeyValueStore) -> Result<InstallId, StoreError> {
    if let Some(raw) = kv.get(INSTALL_ID_KEY)? {
        return record::decode(INSTALL_ID_KEY, &raw);
    }
    let id = InstallId::new();
    kv.put(INSTALL_ID_KEY, &record::encode(&id)?)?;
    tracing::info!(install = %id, "Created install id");
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[test]
    fn install_id_is_stable() {
        let kv = MemoryKvStore::new();
        let first = load_or_create_install_id(&kv).unwrap();
        let second = load_or_create_install_id(&kv).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unwritable_store_fails_on_first_run() {
        let kv = MemoryKvStore::new();
        kv.reject_writes(true);
        assert!(load_or_create_install_id(&kv).is_err());
    }
}
