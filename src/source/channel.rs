//! Channel-based snapshot source.
//!
//! Receives snapshots via a tokio watch channel. A host that owns the HTTP
//! client pushes every fetched collection into the sender; the watcher
//! picks up the latest one on its next tick.

use tokio::sync::watch;

use super::{Snapshot, SnapshotSource};

/// A snapshot source fed through a channel.
///
/// Only the most recent snapshot is kept: if the producer pushes twice
/// between two polls, the older snapshot is skipped. That is safe for
/// reconciliation because every snapshot is a complete collection.
///
/// # Example
///
/// ```
/// use statuswatch::{ChannelSource, Record, SnapshotSource};
///
/// let (tx, mut source) = ChannelSource::create("GET /api/leaves");
/// tx.send(Some(vec![Record::new("PENDING").with_field("id", 1)])).unwrap();
///
/// assert_eq!(source.poll().map(|s| s.len()), Some(1));
/// assert!(source.poll().is_none());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Option<Snapshot>>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of a watch channel; `None` means
    ///   nothing has been fetched yet
    /// * `source_description` - Where the snapshots come from (e.g. an endpoint)
    pub fn new(receiver: watch::Receiver<Option<Snapshot>>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
            closed: false,
        }
    }

    /// Create a channel pair for sending snapshots to a ChannelSource.
    ///
    /// Returns (sender, source). The channel starts empty.
    pub fn create(source_description: &str) -> (watch::Sender<Option<Snapshot>>, Self) {
        let (tx, rx) = watch::channel(None);
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

impl SnapshotSource for ChannelSource {
    fn poll(&mut self) -> Option<Snapshot> {
        match self.receiver.has_changed() {
            Ok(true) => self.receiver.borrow_and_update().clone(),
            Ok(false) => None,
            Err(_) => {
                self.closed = true;
                // A snapshot sent right before the sender dropped is still unseen.
                let latest = self.receiver.borrow_and_update();
                if latest.has_changed() {
                    latest.clone()
                } else {
                    None
                }
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        if self.closed {
            Some("Producer closed")
        } else {
            None
        }
    }
}
