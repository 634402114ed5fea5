//! Identifier types for catalog content and installs.
//!
//! Catalog content (galaxies, planets) is keyed by human-readable string
//! keys such as `"coloria_prime"`. Lessons are addressed by the pair
//! (planet key, scene id). The install itself carries a UUID v7 so local
//! and remote progress records can be keyed by a stable identifier.
//!
//! Older builds addressed planets by a small integer ("legacy id"). Those
//! ids are only accepted at the boundary through [`PlanetRef`] and are
//! resolved once against the catalog; nothing past the boundary sees them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Scene number of a lesson inside its planet.
pub type SceneId = u32;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Generates a newtype wrapper around a catalog string key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from anything string-like.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

define_id! {
    /// Stable per-install identifier. Keys every local and remote record.
    InstallId
}

define_key! {
    /// Canonical catalog key of a planet (e.g. `"toytopia_orbit"`).
    PlanetKey
}

define_key! {
    /// Canonical catalog key of a galaxy (e.g. `"rainbow_nebula"`).
    GalaxyKey
}

/// Address of a single lesson: its planet and scene number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LessonKey {
    /// The planet the lesson belongs to.
    pub planet: PlanetKey,
    /// Scene number inside the planet.
    pub scene: SceneId,
}

impl LessonKey {
    /// Build a lesson key.
    pub fn new(planet: impl Into<PlanetKey>, scene: SceneId) -> Self {
        Self {
            planet: planet.into(),
            scene,
        }
    }
}

impl core::fmt::Display for LessonKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.planet, self.scene)
    }
}

/// A planet reference as received from the gameplay layer.
///
/// Accepts either the canonical key or a legacy numeric id. Resolution to
/// a [`PlanetKey`] happens through the catalog's legacy index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum PlanetRef {
    /// Numeric id used by older clients.
    Legacy(u32),
    /// Canonical catalog key.
    Key(PlanetKey),
}

impl From<PlanetKey> for PlanetRef {
    fn from(key: PlanetKey) -> Self {
        Self::Key(key)
    }
}

impl From<&str> for PlanetRef {
    fn from(key: &str) -> Self {
        Self::Key(PlanetKey::from(key))
    }
}

impl From<u32> for PlanetRef {
    fn from(legacy: u32) -> Self {
        Self::Legacy(legacy)
    }
}

impl core::fmt::Display for PlanetRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Legacy(id) => write!(f, "legacy:{id}"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}
