//! YAML catalog loading.
//!
//! A catalog file lists galaxies and planets (with nested lessons):
//!
//! ```yaml
//! galaxies:
//!   - key: rainbow_nebula
//!     display_name: Rainbow Nebula
//!     order_index: 1
//!     star_threshold: 0
//! planets:
//!   - key: coloria_prime
//!     legacy_id: 1
//!     display_name: Coloria Prime
//!     galaxy: rainbow_nebula
//!     order_index: 1
//!     star_threshold: 0
//!     badge_name: Color Captain
//!     lessons:
//!       - { scene: 1, order_index: 1, title: Red and Blue }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::catalog::{CatalogBuilder, StaticCatalog};
use crate::definitions::{GalaxyDef, PlanetDef};
use crate::error::CatalogError;
use crate::legacy::LEGACY_PLANET_IDS;

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    /// Galaxy descriptors.
    #[serde(default)]
    pub galaxies: Vec<GalaxyDef>,
    /// Planet descriptors with nested lessons.
    #[serde(default)]
    pub planets: Vec<PlanetDef>,
    /// Whether to fold in the built-in legacy id table.
    #[serde(default)]
    pub use_builtin_legacy_ids: bool,
}

impl CatalogFile {
    /// Validate the file contents into a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if validation fails.
    pub fn into_catalog(self) -> Result<StaticCatalog, CatalogError> {
        let mut builder = CatalogBuilder::new();
        for galaxy in self.galaxies {
            builder = builder.galaxy(galaxy);
        }
        for planet in self.planets {
            builder = builder.planet(planet);
        }
        if self.use_builtin_legacy_ids {
            builder = builder.legacy_table(LEGACY_PLANET_IDS);
        }
        builder.build()
    }
}

/// Parse a catalog from a YAML string.
///
/// # Errors
///
/// Returns [`CatalogError::Yaml`] on malformed YAML, or a validation error.
pub fn parse_catalog(yaml: &str) -> Result<StaticCatalog, CatalogError> {
    let file: CatalogFile = serde_yml::from_str(yaml)?;
    file.into_catalog()
}

/// Load a catalog from a YAML file.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the file cannot be read, otherwise as
/// [`parse_catalog`].
pub fn load_catalog(path: &Path) -> Result<StaticCatalog, CatalogError> {
    let contents = std::fs::read_to_string(path)?;
    let catalog = parse_catalog(&contents)?;
    tracing::info!(path = %path.display(), "Catalog loaded");
    Ok(catalog)
}
