//! Time-bounded FIFO of notifications.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::message::{Level, Notification, NotificationId};

/// Ordered buffer of live notifications with automatic expiry.
///
/// Every enqueued message gets a one-shot Tokio timer that removes it after
/// the queue's TTL. Removing a message early cancels its timer; removing an
/// id that is already gone is a no-op.
///
/// The queue is a cheap handle: clones share the same messages, so a poll
/// loop can push while a renderer reads. When the last handle is dropped all
/// pending timers are aborted.
///
/// Timers are spawned onto the current Tokio runtime. Outside of a runtime
/// no timer is scheduled and expired messages are dropped the next time the
/// queue is read instead.
///
/// Renderers that must see every message, however short its TTL, should
/// [`subscribe`](Self::subscribe) rather than sample
/// [`notifications`](Self::notifications).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use statuswatch::NotificationQueue;
///
/// # tokio_test::block_on(async {
/// let queue = NotificationQueue::new(Duration::from_secs(3));
/// let id = queue.enqueue("Your leave on 2024-05-01 was APPROVED");
/// assert_eq!(queue.current_messages(), vec!["Your leave on 2024-05-01 was APPROVED"]);
///
/// queue.remove(id);
/// assert!(queue.is_empty());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    inner: Arc<Inner>,
}

/// Capacity of the enqueue broadcast; slower subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct Inner {
    ttl: Duration,
    state: Mutex<QueueState>,
    events: broadcast::Sender<Notification>,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<Notification>,
    timers: HashMap<NotificationId, JoinHandle<()>>,
    next_id: u64,
}

impl QueueState {
    fn take(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.messages.iter().position(|n| n.id == id)?;
        self.messages.remove(index)
    }

    /// Drop messages past their deadline that have no timer to remove them.
    fn prune_untimed(&mut self) {
        let QueueState { messages, timers, .. } = self;
        if messages.len() == timers.len() {
            return;
        }
        let now = Instant::now();
        messages.retain(|n| timers.contains_key(&n.id) || n.expires_at() > now);
    }
}

impl Inner {
    /// Timer callback: drop the message if it is still live.
    fn expire(&self, id: NotificationId) {
        let mut state = self.state.lock();
        // The timer is finishing on its own, nothing to abort.
        state.timers.remove(&id);
        if let Some(notification) = state.take(id) {
            debug!(id = %id, text = %notification.text, "notification expired");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }
}

impl NotificationQueue {
    /// Create an empty queue whose messages live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                ttl,
                state: Mutex::new(QueueState::default()),
                events,
            }),
        }
    }

    /// Receive every message as it is enqueued, independent of its expiry.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.events.subscribe()
    }

    /// The queue's default time-to-live.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Append an informational message and schedule its expiry.
    pub fn enqueue(&self, text: impl Into<String>) -> NotificationId {
        self.enqueue_with_ttl(text, Level::Info, self.inner.ttl)
    }

    /// Append a message with the given level and the queue's TTL.
    pub fn enqueue_with(&self, text: impl Into<String>, level: Level) -> NotificationId {
        self.enqueue_with_ttl(text, level, self.inner.ttl)
    }

    /// Append a message with its own TTL.
    ///
    /// Expiry order across messages with different TTLs follows timer firing
    /// order, not insertion order.
    pub fn enqueue_with_ttl(
        &self,
        text: impl Into<String>,
        level: Level,
        ttl: Duration,
    ) -> NotificationId {
        let mut state = self.inner.state.lock();

        let id = NotificationId(state.next_id);
        state.next_id += 1;

        let notification = Notification {
            id,
            text: text.into(),
            level,
            created_at: Instant::now(),
            ttl,
        };
        trace!(id = %id, text = %notification.text, "notification enqueued");
        // No subscribers is fine.
        let _ = self.inner.events.send(notification.clone());
        state.messages.push_back(notification);

        let Ok(runtime) = Handle::try_current() else {
            warn!(id = %id, "no Tokio runtime, notification expires on read");
            return id;
        };

        // The timer may fire on another worker before we return; it blocks on
        // the lock until the handle below is registered.
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer = runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(id);
            }
        });
        state.timers.insert(id, timer);

        id
    }

    /// Remove a message before it expires.
    ///
    /// Returns `true` if the message was still live. Removing an unknown or
    /// already expired id is a no-op.
    pub fn remove(&self, id: NotificationId) -> bool {
        let mut state = self.inner.state.lock();
        if let Some(timer) = state.timers.remove(&id) {
            timer.abort();
        }
        state.take(id).is_some()
    }

    /// Remove the oldest live message with exactly this text.
    pub fn remove_text(&self, text: &str) -> bool {
        let id = {
            let mut state = self.inner.state.lock();
            state.prune_untimed();
            state.messages.iter().find(|n| n.text == text).map(|n| n.id)
        };
        id.is_some_and(|id| self.remove(id))
    }

    /// Remove every message and cancel every pending timer.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        state.messages.clear();
    }

    /// Texts of the live messages, oldest first.
    pub fn current_messages(&self) -> Vec<String> {
        let mut state = self.inner.state.lock();
        state.prune_untimed();
        state.messages.iter().map(|n| n.text.clone()).collect()
    }

    /// Live messages with their metadata, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        let mut state = self.inner.state.lock();
        state.prune_untimed();
        state.messages.iter().cloned().collect()
    }

    /// Number of live messages.
    pub fn len(&self) -> usize {
        let mut state = self.inner.state.lock();
        state.prune_untimed();
        state.messages.len()
    }

    /// True if no message is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.inner.state.lock().timers.len()
    }
}
