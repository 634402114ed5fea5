//! Built-in starter catalog.
//!
//! Three galaxies of three planets each, four lessons per planet. Used
//! when no catalog file is configured and as the fixture for engine tests.
//!
//! | Galaxy | Threshold | Planets (threshold) |
//! |--------|-----------|---------------------|
//! | Rainbow Nebula | 0 | Coloria Prime (0), Toytopia Orbit (30), Numeria Station (45) |
//! | Wild Frontier | 50 | Animania Wild (60), Foodora Fields (90), Wordsworth Rings (120) |
//! | Cosmic Wonders | 150 | Weatheria Skies (150), Musica Nova (200), Galactica Home (260) |

use cosmolex_types::{GalaxyKey, PlanetKey};

use crate::catalog::{CatalogBuilder, StaticCatalog};
use crate::definitions::{GalaxyDef, LessonDef, PlanetDef};
use crate::error::CatalogError;
use crate::legacy::LEGACY_PLANET_IDS;

/// Helper to build a [`GalaxyDef`].
fn galaxy(key: &str, name: &str, order_index: u32, star_threshold: u32) -> GalaxyDef {
    GalaxyDef {
        key: GalaxyKey::from(key),
        display_name: name.to_owned(),
        order_index,
        star_threshold,
    }
}

/// Helper to build a [`PlanetDef`] whose lessons are numbered in title order.
fn planet(
    key: &str,
    name: &str,
    galaxy: &str,
    order_index: u32,
    star_threshold: u32,
    badge_name: &str,
    titles: &[&str],
) -> PlanetDef {
    let lessons = (1_u32..)
        .zip(titles)
        .map(|(n, title)| LessonDef {
            scene: n,
            order_index: n,
            title: (*title).to_owned(),
        })
        .collect();

    PlanetDef {
        key: PlanetKey::from(key),
        legacy_id: None,
        display_name: name.to_owned(),
        galaxy: GalaxyKey::from(galaxy),
        order_index,
        star_threshold,
        badge_name: badge_name.to_owned(),
        lessons,
    }
}

/// Create the built-in starter catalog.
///
/// # Errors
///
/// Returns [`CatalogError`] if validation fails (should not happen with
/// the hard-coded data).
pub fn starter_catalog() -> Result<StaticCatalog, CatalogError> {
    CatalogBuilder::new()
        // --- Galaxies ---
        .galaxy(galaxy("rainbow_nebula", "Rainbow Nebula", 1, 0))
        .galaxy(galaxy("wild_frontier", "Wild Frontier", 2, 50))
        .galaxy(galaxy("cosmic_wonders", "Cosmic Wonders", 3, 150))
        // --- Rainbow Nebula ---
        .planet(planet(
            "coloria_prime",
            "Coloria Prime",
            "rainbow_nebula",
            1,
            0,
            "Color Captain",
            &["Red and Blue", "Green and Yellow", "Rainbow Mix", "Color Hunt"],
        ))
        .planet(planet(
            "toytopia_orbit",
            "Toytopia Orbit",
            "rainbow_nebula",
            2,
            30,
            "Toy Tinkerer",
            &["Blocks and Balls", "Dolls and Robots", "Toy Box Sentences", "Playroom Quiz"],
        ))
        .planet(planet(
            "numeria_station",
            "Numeria Station",
            "rainbow_nebula",
            3,
            45,
            "Number Navigator",
            &["One to Five", "Six to Ten", "Counting Crew", "Number Rescue"],
        ))
        // --- Wild Frontier ---
        .planet(planet(
            "animania_wild",
            "Animania Wild",
            "wild_frontier",
            1,
            60,
            "Animal Ranger",
            &["Farm Friends", "Jungle Calls", "Ocean Swimmers", "Who Says That"],
        ))
        .planet(planet(
            "foodora_fields",
            "Foodora Fields",
            "wild_frontier",
            2,
            90,
            "Snack Scout",
            &["Fruits", "Vegetables", "Breakfast Table", "Picnic Words"],
        ))
        .planet(planet(
            "wordsworth_rings",
            "Wordsworth Rings",
            "wild_frontier",
            3,
            120,
            "Ring Reader",
            &["Action Words", "Describing Words", "Little Stories", "Ring Riddles"],
        ))
        // --- Cosmic Wonders ---
        .planet(planet(
            "weatheria_skies",
            "Weatheria Skies",
            "cosmic_wonders",
            1,
            150,
            "Sky Watcher",
            &["Sun and Rain", "Wind and Snow", "Seasons", "Weather Report"],
        ))
        .planet(planet(
            "musica_nova",
            "Musica Nova",
            "cosmic_wonders",
            2,
            200,
            "Melody Maker",
            &["Instruments", "Loud and Quiet", "Song Words", "Band Practice"],
        ))
        .planet(planet(
            "galactica_home",
            "Galactica Home",
            "cosmic_wonders",
            3,
            260,
            "Star Voyager",
            &["Rooms", "Family", "My Day", "Home Again"],
        ))
        .legacy_table(LEGACY_PLANET_IDS)
        .build()
}
