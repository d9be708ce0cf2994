//! Transient notifications.
//!
//! - [`message`]: the [`Notification`] value, its [`NotificationId`] and [`Level`]
//! - [`queue`]: [`NotificationQueue`], a FIFO whose entries expire on their own

pub mod message;
pub mod queue;

pub use message::{Level, Notification, NotificationId};
pub use queue::NotificationQueue;
