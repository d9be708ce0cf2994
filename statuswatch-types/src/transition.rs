//! Transition - a status change observed between two snapshots.

use std::time::Instant;

use crate::{EntityId, Status};

/// A detected change in an entity's status.
///
/// Transitions are produced by a reconciler for entities that were already
/// known and whose status differs from the previously observed one. They
/// are meant to be consumed right away (usually turned into a notification)
/// and are not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<K = EntityId> {
    /// The entity whose status changed.
    pub entity_id: K,
    /// Status recorded by the previous reconciliation.
    pub previous_status: Status,
    /// Status carried by the current snapshot.
    pub new_status: Status,
    /// When the reconciliation that produced this transition started.
    pub observed_at: Instant,
}

impl<K> Transition<K> {
    /// Create a new transition record.
    pub fn new(entity_id: K, previous_status: Status, new_status: Status, observed_at: Instant) -> Self {
        Self {
            entity_id,
            previous_status,
            new_status,
            observed_at,
        }
    }

    /// True when the two statuses differ (always the case for reconciler output).
    pub fn is_change(&self) -> bool {
        self.previous_status != self.new_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_with_generic_key() {
        let t = Transition::new("row-1", Status::from("ABSENT"), Status::from("PRESENT"), Instant::now());
        assert_eq!(t.entity_id, "row-1");
        assert!(t.is_change());
    }

    #[test]
    fn same_status_is_not_a_change() {
        let t = Transition::new(EntityId::from(1), Status::from("A"), Status::from("A"), Instant::now());
        assert!(!t.is_change());
    }
}
