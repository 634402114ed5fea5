//! Legacy numeric planet ids.
//!
//! Clients released before the catalog keys existed addressed planets by
//! position number. The mapping is kept as data and folded into the
//! catalog's legacy index at build time.

/// `(legacy id, canonical planet key)` pairs for the built-in catalog.
pub const LEGACY_PLANET_IDS: &[(u32, &str)] = &[
    (1, "coloria_prime"),
    (2, "toytopia_orbit"),
    (3, "numeria_station"),
    (4, "animania_wild"),
    (5, "foodora_fields"),
    (6, "wordsworth_rings"),
    (7, "weatheria_skies"),
    (8, "musica_nova"),
    (9, "galactica_home"),
];
