//! File-based snapshot source.
//!
//! Polls a JSON file holding an array of records.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::{Snapshot, SnapshotSource};
use crate::error::Result;

/// A snapshot source that reads a JSON array of records from a file.
///
/// The source tracks the file's modification time and only returns new
/// data when the file has been updated.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file's modification time.
    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    /// Read and parse the file.
    fn read_file(&self) -> Result<Snapshot> {
        let content = fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }
}

impl SnapshotSource for FileSource {
    fn poll(&mut self) -> Option<Snapshot> {
        let current_modified = self.get_modified_time();

        // Check if file has been modified since last read
        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // Never read successfully, always try
            (Some(_), None) => false, // File disappeared, keep last data
            (Some(last), Some(current)) => current > last,
        };

        if !file_changed {
            return None;
        }

        match self.read_file() {
            Ok(snapshot) => {
                debug!(path = %self.path.display(), records = snapshot.len(), "snapshot read");
                self.last_error = None;
                self.last_modified = current_modified;
                Some(snapshot)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
