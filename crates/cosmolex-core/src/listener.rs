//! Progress listeners.
//!
//! Listeners receive [`ProgressEvent`]s after the change they describe is
//! durable. Implement [`ProgressListener::on_event`] to see every event,
//! or override only the per-event hooks of interest.

use std::sync::{Arc, Mutex, PoisonError};

use cosmolex_types::{Badge, GalaxyKey, MilestoneKind, PlanetKey, ProgressEvent};

/// Receiver of progression events.
pub trait ProgressListener: Send + Sync {
    /// Called for every event. Dispatches to the per-event hooks by default.
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::StarsChanged { total, delta } => self.on_stars_changed(*total, *delta),
            ProgressEvent::LevelUp { new_level } => self.on_level_up(*new_level),
            ProgressEvent::PlanetUnlocked { key, display_name } => {
                self.on_planet_unlocked(key, display_name);
            }
            ProgressEvent::GalaxyUnlocked { key } => self.on_galaxy_unlocked(key),
            ProgressEvent::BadgeEarned { badge } => self.on_badge_earned(badge),
            ProgressEvent::MilestoneReached { kind, value } => {
                self.on_milestone_reached(*kind, *value);
            }
            ProgressEvent::LessonUnlocked { .. }
            | ProgressEvent::LessonCompleted { .. }
            | ProgressEvent::PlanetCompleted { .. } => {}
        }
    }

    /// The star total changed.
    fn on_stars_changed(&self, _total: u32, _delta: i64) {}

    /// The level increased.
    fn on_level_up(&self, _new_level: u32) {}

    /// A planet was unlocked.
    fn on_planet_unlocked(&self, _key: &PlanetKey, _display_name: &str) {}

    /// A galaxy was unlocked.
    fn on_galaxy_unlocked(&self, _key: &GalaxyKey) {}

    /// A badge was earned.
    fn on_badge_earned(&self, _badge: &Badge) {}

    /// A milestone was reached.
    fn on_milestone_reached(&self, _kind: MilestoneKind, _value: u32) {}
}

/// Ordered set of listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Box<dyn ProgressListener>>,
}

impl core::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Listeners are called in registration order.
    pub fn register(&mut self, listener: Box<dyn ProgressListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `events` to every listener, in order.
    pub fn dispatch(&self, events: &[ProgressEvent]) {
        for event in events {
            for listener in &self.listeners {
                listener.on_event(event);
            }
        }
    }
}

/// Listener that records every event. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every event received so far.
    pub fn drain(&self) -> Vec<ProgressEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ProgressListener for EventLog {
    fn on_event(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
