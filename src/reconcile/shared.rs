//! Mutex-guarded reconciler for streams fed by more than one poller.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use statuswatch_types::{EntityId, Status, Transition};

use super::Reconciler;

/// A cloneable handle to a [`Reconciler`] shared between pollers.
///
/// `reconcile` is a read-check-update pass over the retained map, so the
/// whole pass runs under one lock acquisition.
#[derive(Debug)]
pub struct SharedReconciler<K = EntityId> {
    inner: Arc<Mutex<Reconciler<K>>>,
}

impl<K> Clone for SharedReconciler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> Default for SharedReconciler<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Reconciler::default())),
        }
    }
}

impl<K: Eq + Hash + Clone> SharedReconciler<K> {
    /// Create a shared reconciler in the cold-start state.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`Reconciler::reconcile`].
    pub fn reconcile<I, S>(&self, snapshot: I) -> Vec<Transition<K>>
    where
        I: IntoIterator<Item = (K, S)>,
        S: Into<Status>,
    {
        self.inner.lock().reconcile(snapshot)
    }

    /// See [`Reconciler::acknowledge`].
    pub fn acknowledge(&self, id: K, status: impl Into<Status>) {
        self.inner.lock().acknowledge(id, status);
    }

    /// See [`Reconciler::reset`].
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// See [`Reconciler::is_primed`].
    pub fn is_primed(&self) -> bool {
        self.inner.lock().is_primed()
    }

    /// Last recorded status for `id`.
    pub fn status(&self, id: &K) -> Option<Status> {
        self.inner.lock().status(id).cloned()
    }
}
