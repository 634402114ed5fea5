//! Reconciliation between local progress and the remote backup document.
//!
//! Merging is monotonic: the merged star total is `max(local, remote)` and
//! the merged planet set is `local ∪ remote`. Merging is commutative and
//! idempotent, so a stale document that arrives late is still safe to
//! apply.
//!
//! [`SyncReconciler`] tracks the sync lifecycle: the single in-flight
//! guard, the push-pending flag set by local changes, and the last
//! [`SyncStatus`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use cosmolex_types::{PlanetKey, RemoteProgressDocument, SyncStatus};

/// Result of merging a remote document into local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// `max(local, remote)`.
    pub merged_stars: u32,
    /// Remote planets not yet unlocked locally.
    pub adopted_planets: BTreeSet<PlanetKey>,
}

impl MergePlan {
    /// Whether applying the plan changes local state.
    pub fn changes_local(&self, local_stars: u32) -> bool {
        self.merged_stars > local_stars || !self.adopted_planets.is_empty()
    }
}

/// Compute the monotonic merge of local state with `remote`.
pub fn plan_merge(
    local_stars: u32,
    local_planets: &BTreeSet<PlanetKey>,
    remote: &RemoteProgressDocument,
) -> MergePlan {
    if remote.total_stars < local_stars {
        tracing::debug!(
            local = local_stars,
            remote = remote.total_stars,
            "Remote behind local star total"
        );
    }
    MergePlan {
        merged_stars: local_stars.max(remote.total_stars),
        adopted_planets: remote
            .unlocked_planets
            .difference(local_planets)
            .cloned()
            .collect(),
    }
}

/// Whether the remote copy lacks anything the local state has.
pub fn remote_is_behind(
    local_stars: u32,
    local_planets: &BTreeSet<PlanetKey>,
    remote: Option<&RemoteProgressDocument>,
) -> bool {
    remote.is_none_or(|doc| {
        doc.total_stars < local_stars || !local_planets.is_subset(&doc.unlocked_planets)
    })
}

/// Sync lifecycle state owned by the progression engine.
#[derive(Debug, Clone, Default)]
pub struct SyncReconciler {
    status: SyncStatus,
    in_flight: bool,
    push_pending: bool,
}

impl SyncReconciler {
    /// Create a reconciler that has never synced.
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the most recent sync round.
    pub const fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Whether a fetch or push is outstanding.
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether local changes have not yet reached the remote copy.
    pub const fn is_push_pending(&self) -> bool {
        self.push_pending
    }

    /// Start a round. Returns `false` (and changes nothing) if one is
    /// already in flight; the caller's request is coalesced into it.
    pub fn try_begin(&mut self, now: DateTime<Utc>) -> bool {
        if self.in_flight {
            tracing::debug!("Sync already in flight, coalescing request");
            return false;
        }
        self.in_flight = true;
        self.status = SyncStatus::InFlight { since: now };
        true
    }

    /// A local change touched stars or unlocked planets.
    pub const fn note_local_change(&mut self) {
        self.push_pending = true;
    }

    /// A push is starting with the current local state; clears the
    /// pending flag so later changes set it again.
    pub const fn begin_push(&mut self) {
        self.push_pending = false;
    }

    /// The round finished successfully.
    pub fn complete(&mut self, now: DateTime<Utc>, pushed: bool) {
        self.in_flight = false;
        self.status = SyncStatus::Synced { at: now, pushed };
    }

    /// The round failed. Local state stays authoritative; the next local
    /// change retries.
    pub fn fail(&mut self, now: DateTime<Utc>, reason: impl Into<String>) {
        self.in_flight = false;
        self.push_pending = true;
        self.status = SyncStatus::Failed {
            at: now,
            reason: reason.into(),
        };
    }

    /// Whether the last round failed and nothing is in flight.
    pub const fn needs_retry(&self) -> bool {
        !self.in_flight && matches!(self.status, SyncStatus::Failed { .. })
    }

    /// Forget all sync state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planets(keys: &[&str]) -> BTreeSet<PlanetKey> {
        keys.iter().map(|k| PlanetKey::from(*k)).collect()
    }

    fn doc(stars: u32, keys: &[&str]) -> RemoteProgressDocument {
        RemoteProgressDocument {
            total_stars: stars,
            unlocked_planets: planets(keys),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn merge_takes_max_and_union() {
        let local = planets(&["coloria_prime", "toytopia_orbit"]);
        let remote = doc(55, &["coloria_prime", "toytopia_orbit", "animania_wild"]);
        let plan = plan_merge(40, &local, &remote);
        assert_eq!(plan.merged_stars, 55);
        assert_eq!(plan.adopted_planets, planets(&["animania_wild"]));
        assert!(plan.changes_local(40));
    }

    #[test]
    fn merge_never_lowers_local() {
        let local = planets(&["coloria_prime", "toytopia_orbit"]);
        let plan = plan_merge(40, &local, &doc(10, &["coloria_prime"]));
        assert_eq!(plan.merged_stars, 40);
        assert!(plan.adopted_planets.is_empty());
        assert!(!plan.changes_local(40));
    }

    #[test]
    fn merge_is_commutative_on_stars() {
        let empty = BTreeSet::new();
        let a = plan_merge(12, &empty, &doc(30, &[])).merged_stars;
        let b = plan_merge(30, &empty, &doc(12, &[])).merged_stars;
        assert_eq!(a, b);
    }

    #[test]
    fn remote_behind_detection() {
        let local = planets(&["coloria_prime"]);
        assert!(remote_is_behind(5, &local, None));
        assert!(remote_is_behind(5, &local, Some(&doc(4, &["coloria_prime"]))));
        assert!(remote_is_behind(5, &local, Some(&doc(5, &[]))));
        assert!(!remote_is_behind(5, &local, Some(&doc(5, &["coloria_prime"]))));
        assert!(!remote_is_behind(5, &local, Some(&doc(9, &["coloria_prime", "x"]))));
    }

    #[test]
    fn in_flight_guard_coalesces() {
        let mut sync = SyncReconciler::new();
        assert!(sync.try_begin(Utc::now()));
        assert!(!sync.try_begin(Utc::now()));
        sync.complete(Utc::now(), false);
        assert!(!sync.is_in_flight());
        assert!(sync.try_begin(Utc::now()));
    }

    #[test]
    fn failure_marks_push_pending_and_retry() {
        let mut sync = SyncReconciler::new();
        assert!(sync.try_begin(Utc::now()));
        sync.fail(Utc::now(), "offline");
        assert!(sync.is_push_pending());
        assert!(sync.needs_retry());
        assert!(matches!(sync.status(), SyncStatus::Failed { reason, .. } if reason == "offline"));
    }
}
