//! # statuswatch
//!
//! Status-change detection and toast notifications for polled collections.
//!
//! Dashboards that re-fetch a mutable collection on a timer (leave requests,
//! attendance rows) need to tell the user when a record changed status,
//! exactly once, without a burst of false alarms when the screen first
//! loads. This crate packages that logic as two small components plus the
//! glue that drives them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  Snapshot   ┌────────────┐ Transitions ┌─────────────┐  text  ┌───────────────────┐
//! │ SnapshotSource│───────────▶│ Reconciler │────────────▶│  Formatter  │───────▶│ NotificationQueue │──▶ renderer
//! │ (file/channel)│            │ (per stream)│            │ (per screen)│        │  (TTL expiry)     │
//! └──────────────┘             └────────────┘             └─────────────┘        └───────────────────┘
//!         ▲                                  StatusWatcher::tick / spawn
//!         └──────────────────────────────────────────────────────────────
//! ```
//!
//! - **[`reconcile`]**: [`Reconciler`] detects per-entity status changes between
//!   successive full snapshots, silent on the first call and for new entities
//! - **[`notify`]**: [`NotificationQueue`], a FIFO of messages that expire on
//!   their own after a TTL and can be removed early
//! - **[`source`]**: the [`SnapshotSource`] trait with file and channel implementations
//! - **[`template`]**: per-screen wording of notifications
//! - **[`watcher`]**: [`StatusWatcher`], which wires the above into a poll loop
//! - **[`config`]**: layered [`Settings`] (defaults, TOML file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a JSON file with an employee's leave requests
//! statuswatch --file leaves.json
//!
//! # HR view, polled every 5 seconds, toasts visible for 3.5 seconds
//! statuswatch --file leaves.json --stream leave-review --refresh 5s --ttl 3500ms
//! ```
//!
//! ### As a library
//!
//! ```
//! use statuswatch::Reconciler;
//!
//! let mut reconciler = Reconciler::new();
//! reconciler.reconcile([(1, "A"), (2, "A")]);
//!
//! let transitions = reconciler.reconcile([(1, "B"), (2, "A"), (3, "A")]);
//! assert_eq!(transitions.len(), 1);
//! assert_eq!(transitions[0].entity_id, 1);
//! ```
//!
//! ### Driving a watcher from a host's own fetcher
//!
//! ```no_run
//! use std::time::Duration;
//! use statuswatch::{ChannelSource, NotificationQueue, StatusWatcher};
//! use statuswatch::template::LeaveFormatter;
//!
//! # tokio_test::block_on(async {
//! let (tx, source) = ChannelSource::create("GET /api/leaves");
//! let queue = NotificationQueue::new(Duration::from_secs(3));
//! let watcher = StatusWatcher::new(Box::new(source), Box::new(LeaveFormatter), queue);
//!
//! let handle = watcher.spawn(Duration::from_secs(15));
//! // ... the HTTP client pushes every fetched collection with tx.send(Some(records)) ...
//! let watcher = handle.stop().await;
//! # });
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod notify;
pub mod reconcile;
pub mod source;
pub mod template;
pub mod watcher;

// Re-export main types for convenience
pub use config::{ReentryPolicy, Settings, StreamKind};
pub use error::{Error, Result};
pub use notify::{Level, Notification, NotificationId, NotificationQueue};
pub use reconcile::{Reconciler, SharedReconciler};
pub use source::{ChannelSource, FileSource, Record, RecordKey, Snapshot, SnapshotSource};
pub use statuswatch_types::{EntityId, Status, Transition};
pub use watcher::{StatusWatcher, WatchHandle};
