//! Versioned record envelopes.
//!
//! Every stored value is wrapped as `{"schema_version": N, "payload": ...}`.
//! Readers accept any version up to [`CURRENT_SCHEMA_VERSION`] and upgrade
//! older payloads through [`Record::upgrade`]. A value without an envelope,
//! or with a newer version, is rejected rather than defaulted.

use std::collections::BTreeSet;

use cosmolex_types::{InstallId, LedgerRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Highest schema version this build reads and the version it writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Envelope around a stored payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Schema version the payload was written with.
    pub schema_version: u32,
    /// The record itself.
    pub payload: T,
}

impl<T> Versioned<T> {
    /// Wrap `payload` at the current schema version.
    pub const fn current(payload: T) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// A value that can be stored in a versioned envelope.
pub trait Record: Serialize + DeserializeOwned {
    /// Build the current shape from a payload written at `version`.
    ///
    /// The default reads the payload unchanged, which is correct for
    /// records whose shape never changed.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload does not match.
    fn upgrade(version: u32, payload: Value) -> Result<Self, serde_json::Error> {
        let _ = version;
        serde_json::from_value(payload)
    }
}

impl<T> Record for BTreeSet<T> where T: Ord + Serialize + DeserializeOwned {}

impl Record for InstallId {}

/// Ledger payload written by schema version 1.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LedgerRecordV1 {
    stars: u32,
    words: u32,
    games: u32,
    fuel_cells: u32,
    crystals: u32,
}

impl From<LedgerRecordV1> for LedgerRecord {
    fn from(v1: LedgerRecordV1) -> Self {
        Self {
            total_stars: v1.stars,
            total_fuel_cells: v1.fuel_cells,
            total_crystals: v1.crystals,
            words_learned: v1.words,
            games_completed: v1.games,
            ..Self::default()
        }
    }
}

impl Record for LedgerRecord {
    fn upgrade(version: u32, payload: Value) -> Result<Self, serde_json::Error> {
        if version == 1 {
            let v1: LedgerRecordV1 = serde_json::from_value(payload)?;
            tracing::info!(stars = v1.stars, "Migrating ledger record from schema v1");
            return Ok(v1.into());
        }
        serde_json::from_value(payload)
    }
}

/// Serialize `value` in a current-version envelope.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if serialization fails.
pub fn encode<T: Record>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&Versioned::current(value))?)
}

/// Parse an envelope read from `key`, upgrading older payloads.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedSchema`] when the envelope is missing
/// (reported as version 0) or newer than [`CURRENT_SCHEMA_VERSION`], and
/// [`StoreError::Serialization`] when the payload does not parse.
pub fn decode<T: Record>(key: &str, raw: &str) -> Result<T, StoreError> {
    let value: Value = serde_json::from_str(raw)?;
    let unsupported = |found: u32| StoreError::UnsupportedSchema {
        key: key.to_owned(),
        found,
        supported: CURRENT_SCHEMA_VERSION,
    };

    let Value::Object(mut fields) = value else {
        return Err(unsupported(0));
    };
    let version = fields
        .get("schema_version")
        .and_then(Value::as_u64)
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));
    let Some(payload) = fields.remove("payload") else {
        return Err(unsupported(0));
    };
    if version == 0 || version > CURRENT_SCHEMA_VERSION {
        return Err(unsupported(version));
    }
    if version < CURRENT_SCHEMA_VERSION {
        tracing::debug!(key, version, "Upgrading stored record");
    }

    Ok(T::upgrade(version, payload)?)
}
