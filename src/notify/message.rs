//! Notification messages held by the queue.

use std::fmt;
use std::time::{Duration, Instant};

/// Identifier of a queued notification.
///
/// Ids are assigned from a per-queue counter and never reused, so removing
/// an id that already expired can never hit a newer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub(crate) u64);

impl NotificationId {
    /// The raw counter value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Severity of a notification, used by renderers to pick a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    Info,
    Success,
    Error,
}

impl Level {
    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Success => "OK",
            Level::Error => "ERROR",
        }
    }
}

/// A live notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    pub level: Level,
    pub created_at: Instant,
    /// Time after `created_at` at which the queue drops this message.
    pub ttl: Duration,
}

impl Notification {
    /// Instant at which the message expires.
    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }
}
