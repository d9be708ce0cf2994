//! Error types for the library.

use thiserror::Error;

/// Errors raised while configuring or feeding a watcher.
///
/// The reconciler and the notification queue never fail; these errors come
/// from the ambient layers around them.
#[derive(Debug, Error)]
pub enum Error {
    /// A duration string could not be parsed.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Loading or deserializing settings failed.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A setting had a value outside its allowed set.
    #[error("Invalid setting {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },

    /// Reading a snapshot failed.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
