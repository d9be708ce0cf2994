//! Watcher settings.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `STATUSWATCH_*` environment variables.
//!
//! ```toml
//! poll_interval = "15s"
//! notification_ttl = "3500ms"
//! stream = "leave-review"
//! reentry = "preserve"
//! ```

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::source::RecordKey;
use crate::template::{AttendanceFormatter, LeaveFormatter, LeaveReviewFormatter, TransitionFormatter};

/// Which collection is being watched.
///
/// Selects the wording of notifications and how records are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StreamKind {
    /// An employee's own leave requests.
    #[default]
    Leave,
    /// All leave requests, as seen by HR.
    LeaveReview,
    /// Attendance rows, keyed by employee and date.
    Attendance,
}

impl StreamKind {
    /// Formatter with the wording for this stream.
    pub fn formatter(&self) -> Box<dyn TransitionFormatter> {
        match self {
            StreamKind::Leave => Box::new(LeaveFormatter),
            StreamKind::LeaveReview => Box::new(LeaveReviewFormatter),
            StreamKind::Attendance => Box::new(AttendanceFormatter),
        }
    }

    /// How records of this stream are keyed.
    pub fn record_key(&self) -> RecordKey {
        match self {
            StreamKind::Leave | StreamKind::LeaveReview => RecordKey::field("id"),
            StreamKind::Attendance => RecordKey::composite(&["employeeId", "date"]),
        }
    }
}

/// What happens to a watcher's history when its screen is entered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReentryPolicy {
    /// Start over: the next poll is a cold start and reports nothing.
    #[default]
    ColdStart,
    /// Keep the retained statuses; changes made while away are reported.
    Preserve,
}

/// Resolved settings for one watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// How often the source is polled.
    pub poll_interval: Duration,
    /// How long a notification stays visible.
    pub notification_ttl: Duration,
    pub stream: StreamKind,
    pub reentry: ReentryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            notification_ttl: Duration::from_secs(3),
            stream: StreamKind::default(),
            reentry: ReentryPolicy::default(),
        }
    }
}

/// Settings as they appear in files and the environment.
#[derive(Debug, Deserialize)]
struct RawSettings {
    poll_interval: String,
    notification_ttl: String,
    stream: StreamKind,
    reentry: ReentryPolicy,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// A missing file is only an error when a path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("poll_interval", "15s")?
            .set_default("notification_ttl", "3s")?
            .set_default("stream", "leave")?
            .set_default("reentry", "cold-start")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let raw: RawSettings = builder
            .add_source(Environment::with_prefix("STATUSWATCH"))
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let poll_interval = parse_duration(&raw.poll_interval)?;
        if poll_interval.is_zero() {
            return Err(Error::InvalidSetting {
                key: "poll_interval",
                value: raw.poll_interval,
            });
        }

        Ok(Self {
            poll_interval,
            notification_ttl: parse_duration(&raw.notification_ttl)?,
            stream: raw.stream,
            reentry: raw.reentry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
            poll_interval = "5s"
            notification_ttl = "3500ms"
            stream = "leave-review"
            reentry = "preserve"
            "#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.notification_ttl, Duration::from_millis(3500));
        assert_eq!(settings.stream, StreamKind::LeaveReview);
        assert_eq!(settings.reentry, ReentryPolicy::Preserve);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = toml_file(r#"stream = "attendance""#);

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.stream, StreamKind::Attendance);
        assert_eq!(settings.poll_interval, Duration::from_secs(15));
    }

    #[test]
    fn bad_duration_is_rejected() {
        let file = toml_file(r#"notification_ttl = "soon""#);
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(Error::InvalidDuration(_))
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let file = toml_file(r#"poll_interval = "0s""#);
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(Error::InvalidSetting { key: "poll_interval", .. })
        ));
    }

    #[test]
    fn unknown_stream_is_a_config_error() {
        let file = toml_file(r#"stream = "payroll""#);
        assert!(matches!(Settings::load(Some(file.path())), Err(Error::Config(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/statuswatch.toml"))).is_err());
    }

    #[test]
    fn stream_kind_keys() {
        assert_eq!(StreamKind::Leave.record_key(), RecordKey::field("id"));
        assert_eq!(
            StreamKind::Attendance.record_key(),
            RecordKey::composite(&["employeeId", "date"])
        );
    }
}
