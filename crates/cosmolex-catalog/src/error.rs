//! Error types for the `cosmolex-catalog` crate.
//!
//! All fallible catalog construction and loading returns [`CatalogError`].

use cosmolex_types::{GalaxyKey, PlanetKey, SceneId};

/// Errors that can occur while building or loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two galaxies share a key.
    #[error("duplicate galaxy key: {0}")]
    DuplicateGalaxy(GalaxyKey),

    /// Two planets share a key.
    #[error("duplicate planet key: {0}")]
    DuplicatePlanet(PlanetKey),

    /// A planet names a galaxy that is not in the catalog.
    #[error("planet {planet} references unknown galaxy {galaxy}")]
    UnknownGalaxy {
        /// The planet with the dangling reference.
        planet: PlanetKey,
        /// The galaxy it references.
        galaxy: GalaxyKey,
    },

    /// A planet has no lessons.
    #[error("planet {0} has no lessons")]
    EmptyPlanet(PlanetKey),

    /// Two lessons of one planet share a scene id.
    #[error("planet {planet} has duplicate scene {scene}")]
    DuplicateScene {
        /// The planet.
        planet: PlanetKey,
        /// The repeated scene id.
        scene: SceneId,
    },

    /// Lesson order indexes are not exactly `1..=n`.
    #[error("planet {planet} lesson order is not contiguous from 1 (found {found} at position {position})")]
    BrokenLessonOrder {
        /// The planet.
        planet: PlanetKey,
        /// Expected 1-based position.
        position: u32,
        /// Order index found there.
        found: u32,
    },

    /// One legacy id maps to two planets.
    #[error("legacy planet id {legacy_id} is claimed by both {first} and {second}")]
    DuplicateLegacyId {
        /// The legacy id.
        legacy_id: u32,
        /// First planet claiming it.
        first: PlanetKey,
        /// Second planet claiming it.
        second: PlanetKey,
    },

    /// The legacy table names a planet that is not in the catalog.
    #[error("legacy planet id {legacy_id} points at unknown planet {planet}")]
    UnknownLegacyTarget {
        /// The legacy id.
        legacy_id: u32,
        /// The missing planet.
        planet: PlanetKey,
    },

    /// The catalog has no galaxies, so there is nothing to seed.
    #[error("catalog contains no galaxies")]
    Empty,

    /// Failed to read a catalog file from disk.
    #[error("failed to read catalog file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse catalog YAML.
    #[error("failed to parse catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for CatalogError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
