//! Snapshot reconciliation.
//!
//! A [`Reconciler`] remembers the last status it saw for every entity of one
//! polled collection and, given a fresh full snapshot, reports which entities
//! changed status since the previous call.
//!
//! ```text
//! poll #1  {1: PENDING, 2: PENDING}              -> []            (cold start)
//! poll #2  {1: APPROVED, 2: PENDING, 3: PENDING} -> [1: PENDING -> APPROVED]
//! poll #3  {2: REJECTED}                         -> [2: PENDING -> REJECTED]
//! ```
//!
//! Entities seen for the first time never produce a transition, and entities
//! missing from a snapshot keep their last known status.

mod shared;

pub use shared::SharedReconciler;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use statuswatch_types::{EntityId, Status, Transition};

/// Detects per-entity status transitions between successive snapshots.
///
/// One reconciler tracks exactly one logical stream (one screen, one
/// poller). It is not synchronized; see [`SharedReconciler`] when several
/// pollers must feed the same instance.
///
/// # Example
///
/// ```
/// use statuswatch::Reconciler;
///
/// let mut reconciler = Reconciler::new();
///
/// // The first call only primes the cache.
/// assert!(reconciler.reconcile([(1, "PENDING")]).is_empty());
///
/// let transitions = reconciler.reconcile([(1, "APPROVED")]);
/// assert_eq!(transitions.len(), 1);
/// assert_eq!(transitions[0].previous_status, "PENDING");
/// assert_eq!(transitions[0].new_status, "APPROVED");
/// ```
#[derive(Debug, Clone)]
pub struct Reconciler<K = EntityId> {
    statuses: HashMap<K, Status>,
    primed: bool,
}

impl<K> Default for Reconciler<K> {
    fn default() -> Self {
        Self {
            statuses: HashMap::new(),
            primed: false,
        }
    }
}

impl<K: Eq + Hash + Clone> Reconciler<K> {
    /// Create a reconciler in the cold-start state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile a freshly fetched snapshot against the retained one.
    ///
    /// Returns the transitions in the snapshot's iteration order. Nothing is
    /// returned on the first call, for entities not seen before, or for
    /// entities whose status is unchanged. Every status in `snapshot` is
    /// recorded regardless.
    ///
    /// Ids are expected to be unique within one snapshot; a repeated id is
    /// processed in order, so its last occurrence wins.
    pub fn reconcile<I, S>(&mut self, snapshot: I) -> Vec<Transition<K>>
    where
        I: IntoIterator<Item = (K, S)>,
        S: Into<Status>,
    {
        let observed_at = Instant::now();
        let emit = self.primed;
        let mut transitions = Vec::new();

        for (id, status) in snapshot {
            let status = status.into();
            match self.statuses.entry(id) {
                Entry::Occupied(mut entry) => {
                    if *entry.get() == status {
                        continue;
                    }
                    let previous = entry.insert(status.clone());
                    if emit {
                        transitions.push(Transition::new(
                            entry.key().clone(),
                            previous,
                            status,
                            observed_at,
                        ));
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(status);
                }
            }
        }

        self.primed = true;
        transitions
    }

    /// Record a status the caller already knows about without reporting it.
    ///
    /// Used after a local action (e.g. approving a leave request) so that the
    /// next poll does not announce the caller's own change a second time.
    pub fn acknowledge(&mut self, id: K, status: impl Into<Status>) {
        self.statuses.insert(id, status.into());
    }

    /// Forget every entity and return to the cold-start state.
    pub fn reset(&mut self) {
        self.statuses.clear();
        self.primed = false;
    }

    /// True once at least one reconciliation has completed.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Last recorded status for `id`.
    pub fn status(&self, id: &K) -> Option<&Status> {
        self.statuses.get(id)
    }

    /// Number of entities tracked.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// True if no entity has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
