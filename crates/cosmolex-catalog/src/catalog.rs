//! The [`ContentCatalog`] trait and its in-memory implementation.
//!
//! The progression engine only ever reads from a catalog. Ordering and
//! thresholds come from here; unlock state lives elsewhere.
//!
//! [`StaticCatalog`] is immutable once built. [`CatalogBuilder`] validates
//! the content and folds every legacy planet id into a single index, so
//! the rest of the system only ever deals with canonical [`PlanetKey`]s.

use std::collections::BTreeMap;

use cosmolex_types::{GalaxyKey, LessonKey, PlanetKey, PlanetRef, SceneId};

use crate::definitions::{GalaxyDef, LessonDef, PlanetDef};
use crate::error::CatalogError;

/// Read-only access to content ordering and thresholds.
///
/// Planets are returned ordered by galaxy order, then planet order.
/// Lessons are returned ordered by `order_index`.
pub trait ContentCatalog: Send + Sync {
    /// All galaxies, ordered.
    fn galaxies(&self) -> &[GalaxyDef];

    /// All planets, ordered.
    fn planets(&self) -> &[PlanetDef];

    /// Look up a galaxy by key.
    fn galaxy(&self, key: &GalaxyKey) -> Option<&GalaxyDef>;

    /// Look up a planet by key.
    fn planet(&self, key: &PlanetKey) -> Option<&PlanetDef>;

    /// Resolve a legacy numeric planet id.
    fn resolve_legacy(&self, legacy_id: u32) -> Option<&PlanetKey>;

    /// Ordered lessons of a planet.
    fn lessons_for_planet(&self, planet: &PlanetKey) -> Option<&[LessonDef]> {
        self.planet(planet).map(|p| p.lessons.as_slice())
    }

    /// Stars required to unlock a planet.
    fn planet_threshold(&self, planet: &PlanetKey) -> Option<u32> {
        self.planet(planet).map(|p| p.star_threshold)
    }

    /// Stars required to unlock a galaxy.
    fn galaxy_threshold(&self, galaxy: &GalaxyKey) -> Option<u32> {
        self.galaxy(galaxy).map(|g| g.star_threshold)
    }

    /// Planets belonging to a galaxy, ordered.
    fn planets_for_galaxy(&self, galaxy: &GalaxyKey) -> Vec<&PlanetDef> {
        self.planets()
            .iter()
            .filter(|p| &p.galaxy == galaxy)
            .collect()
    }

    /// Resolve either form of planet reference to its canonical key.
    fn resolve_planet(&self, planet: &PlanetRef) -> Option<PlanetKey> {
        match planet {
            PlanetRef::Legacy(id) => self.resolve_legacy(*id).cloned(),
            PlanetRef::Key(key) => self.planet(key).map(|p| p.key.clone()),
        }
    }

    /// Look up a single lesson.
    fn lesson(&self, lesson: &LessonKey) -> Option<&LessonDef> {
        self.lessons_for_planet(&lesson.planet)?
            .iter()
            .find(|l| l.scene == lesson.scene)
    }

    /// The first lesson of a planet (order index 1).
    fn first_lesson(&self, planet: &PlanetKey) -> Option<LessonKey> {
        self.lessons_for_planet(planet)?
            .first()
            .map(|l| LessonKey::new(planet.clone(), l.scene))
    }

    /// The lesson immediately before `lesson`, or `None` for the first.
    fn previous_lesson(&self, lesson: &LessonKey) -> Option<LessonKey> {
        let lessons = self.lessons_for_planet(&lesson.planet)?;
        let position = lessons.iter().position(|l| l.scene == lesson.scene)?;
        let previous = position.checked_sub(1)?;
        lessons
            .get(previous)
            .map(|l| LessonKey::new(lesson.planet.clone(), l.scene))
    }

    /// The lesson immediately after `lesson`, or `None` for the last.
    fn next_lesson(&self, lesson: &LessonKey) -> Option<LessonKey> {
        let lessons = self.lessons_for_planet(&lesson.planet)?;
        let position = lessons.iter().position(|l| l.scene == lesson.scene)?;
        lessons
            .get(position.saturating_add(1))
            .map(|l| LessonKey::new(lesson.planet.clone(), l.scene))
    }

    /// The first galaxy in catalog order.
    fn first_galaxy(&self) -> Option<&GalaxyDef> {
        self.galaxies().first()
    }
}

/// Immutable, validated catalog held in memory.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    galaxies: Vec<GalaxyDef>,
    planets: Vec<PlanetDef>,
    galaxy_index: BTreeMap<GalaxyKey, usize>,
    planet_index: BTreeMap<PlanetKey, usize>,
    legacy_index: BTreeMap<u32, PlanetKey>,
}

impl StaticCatalog {
    /// Start building a catalog.
    pub const fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Number of lessons across all planets.
    pub fn lesson_count(&self) -> usize {
        self.planets.iter().map(|p| p.lessons.len()).sum()
    }
}

impl ContentCatalog for StaticCatalog {
    fn galaxies(&self) -> &[GalaxyDef] {
        &self.galaxies
    }

    fn planets(&self) -> &[PlanetDef] {
        &self.planets
    }

    fn galaxy(&self, key: &GalaxyKey) -> Option<&GalaxyDef> {
        self.galaxy_index
            .get(key)
            .and_then(|&idx| self.galaxies.get(idx))
    }

    fn planet(&self, key: &PlanetKey) -> Option<&PlanetDef> {
        self.planet_index
            .get(key)
            .and_then(|&idx| self.planets.get(idx))
    }

    fn resolve_legacy(&self, legacy_id: u32) -> Option<&PlanetKey> {
        self.legacy_index.get(&legacy_id)
    }
}

/// Collects and validates catalog content.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    galaxies: Vec<GalaxyDef>,
    planets: Vec<PlanetDef>,
    legacy_table: Vec<(u32, PlanetKey)>,
}

impl CatalogBuilder {
    /// Create an empty builder.
    pub const fn new() -> Self {
        Self {
            galaxies: Vec::new(),
            planets: Vec::new(),
            legacy_table: Vec::new(),
        }
    }

    /// Add a galaxy.
    #[must_use]
    pub fn galaxy(mut self, galaxy: GalaxyDef) -> Self {
        self.galaxies.push(galaxy);
        self
    }

    /// Add a planet with its lessons.
    #[must_use]
    pub fn planet(mut self, planet: PlanetDef) -> Self {
        self.planets.push(planet);
        self
    }

    /// Add entries of a static legacy-id table.
    #[must_use]
    pub fn legacy_table(mut self, table: &[(u32, &str)]) -> Self {
        self.legacy_table
            .extend(table.iter().map(|&(id, key)| (id, PlanetKey::from(key))));
        self
    }

    /// Validate and build the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when keys collide, a planet references an
    /// unknown galaxy, lesson order is broken, or legacy ids conflict.
    pub fn build(self) -> Result<StaticCatalog, CatalogError> {
        let Self {
            mut galaxies,
            mut planets,
            legacy_table,
        } = self;

        if galaxies.is_empty() {
            return Err(CatalogError::Empty);
        }

        galaxies.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut galaxy_order: BTreeMap<GalaxyKey, u32> = BTreeMap::new();
        for galaxy in &galaxies {
            if galaxy_order
                .insert(galaxy.key.clone(), galaxy.order_index)
                .is_some()
            {
                return Err(CatalogError::DuplicateGalaxy(galaxy.key.clone()));
            }
        }

        for planet in &mut planets {
            if !galaxy_order.contains_key(&planet.galaxy) {
                return Err(CatalogError::UnknownGalaxy {
                    planet: planet.key.clone(),
                    galaxy: planet.galaxy.clone(),
                });
            }
            validate_lessons(&planet.key, &mut planet.lessons)?;
        }

        planets.sort_by(|a, b| {
            let ga = galaxy_order.get(&a.galaxy).copied().unwrap_or(u32::MAX);
            let gb = galaxy_order.get(&b.galaxy).copied().unwrap_or(u32::MAX);
            ga.cmp(&gb)
                .then_with(|| a.order_index.cmp(&b.order_index))
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut planet_index = BTreeMap::new();
        for (idx, planet) in planets.iter().enumerate() {
            if planet_index.insert(planet.key.clone(), idx).is_some() {
                return Err(CatalogError::DuplicatePlanet(planet.key.clone()));
            }
        }

        let mut legacy_index: BTreeMap<u32, PlanetKey> = BTreeMap::new();
        let declared = planets
            .iter()
            .filter_map(|p| p.legacy_id.map(|id| (id, p.key.clone())));
        for (legacy_id, planet) in declared.chain(legacy_table) {
            if !planet_index.contains_key(&planet) {
                return Err(CatalogError::UnknownLegacyTarget { legacy_id, planet });
            }
            match legacy_index.get(&legacy_id) {
                Some(existing) if existing == &planet => {}
                Some(existing) => {
                    return Err(CatalogError::DuplicateLegacyId {
                        legacy_id,
                        first: existing.clone(),
                        second: planet,
                    });
                }
                None => {
                    legacy_index.insert(legacy_id, planet);
                }
            }
        }

        let galaxy_index = galaxies
            .iter()
            .enumerate()
            .map(|(idx, g)| (g.key.clone(), idx))
            .collect();

        tracing::debug!(
            galaxies = galaxies.len(),
            planets = planets.len(),
            legacy_ids = legacy_index.len(),
            "Catalog built"
        );

        Ok(StaticCatalog {
            galaxies,
            planets,
            galaxy_index,
            planet_index,
            legacy_index,
        })
    }
}

/// Sort lessons by order index and check they run `1..=n` with unique scenes.
fn validate_lessons(planet: &PlanetKey, lessons: &mut [LessonDef]) -> Result<(), CatalogError> {
    if lessons.is_empty() {
        return Err(CatalogError::EmptyPlanet(planet.clone()));
    }

    lessons.sort_by_key(|l| l.order_index);

    let mut scenes: Vec<SceneId> = Vec::with_capacity(lessons.len());
    let mut expected: u32 = 1;
    for lesson in lessons.iter() {
        if lesson.order_index != expected {
            return Err(CatalogError::BrokenLessonOrder {
                planet: planet.clone(),
                position: expected,
                found: lesson.order_index,
            });
        }
        if scenes.contains(&lesson.scene) {
            return Err(CatalogError::DuplicateScene {
                planet: planet.clone(),
                scene: lesson.scene,
            });
        }
        scenes.push(lesson.scene);
        expected = expected.saturating_add(1);
    }

    Ok(())
}
