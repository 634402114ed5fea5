//! Read-only content catalog for the Cosmolex progression engine.
//!
//! The catalog supplies ordering and star thresholds for galaxies,
//! planets and lessons. It is loaded once and never mutated; unlock state
//! is tracked by the store and engine crates.
//!
//! # Modules
//!
//! - [`catalog`] -- [`ContentCatalog`] trait, [`StaticCatalog`] and its
//!   validating [`CatalogBuilder`].
//! - [`definitions`] -- Galaxy, planet and lesson descriptors.
//! - [`error`] -- [`CatalogError`].
//! - [`legacy`] -- Static legacy planet id table.
//! - [`loader`] -- YAML catalog files.
//! - [`starter`] -- Built-in starter catalog.

pub mod catalog;
pub mod definitions;
pub mod error;
pub mod legacy;
pub mod loader;
pub mod starter;

// Re-export primary types at crate root.
pub use catalog::{CatalogBuilder, ContentCatalog, StaticCatalog};
pub use definitions::{GalaxyDef, LessonDef, PlanetDef};
pub use error::CatalogError;
pub use legacy::LEGACY_PLANET_IDS;
pub use loader::{CatalogFile, load_catalog, parse_catalog};
pub use starter::starter_catalog;
