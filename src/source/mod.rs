//! Snapshot source abstraction.
//!
//! The fetch side of a poller lives outside this crate (an HTTP client, a
//! file written by another process, a test harness). This module provides a
//! trait-based abstraction over it plus two implementations.

mod channel;
mod file;
mod snapshot;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use snapshot::{Record, RecordKey, Snapshot};

use std::fmt::Debug;

/// Trait for receiving fetched collections from various sources.
///
/// # Example
///
/// ```
/// use statuswatch::{FileSource, SnapshotSource};
///
/// let mut source = FileSource::new("leaves.json");
/// if let Some(snapshot) = source.poll() {
///     println!("Got {} records", snapshot.len());
/// }
/// ```
pub trait SnapshotSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(snapshot)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Snapshot>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// Returns the error message of the last failed fetch, if the most
    /// recent attempt failed.
    fn error(&self) -> Option<&str>;
}
