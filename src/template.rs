//! Wording of transition notifications.
//!
//! The reconciler only reports *that* a status changed; how that reads to a
//! user depends on the screen. A [`TransitionFormatter`] turns a transition
//! and the record it came from into the text shown in a toast.

use std::fmt;

use statuswatch_types::Transition;

use crate::source::Record;

/// Turns transitions into notification text for one screen.
pub trait TransitionFormatter: Send + fmt::Debug {
    /// Text for one transition, or `None` to stay silent about it.
    fn format(&self, transition: &Transition, record: &Record) -> Option<String>;

    /// Text shown once after the cold-start reconciliation, if any.
    fn cold_start_summary(&self, _snapshot: &[Record]) -> Option<String> {
        None
    }

    /// Text of the error notification shown when a fetch fails.
    fn load_failure(&self) -> String {
        "Failed to load records.".to_string()
    }
}

/// `from {start} to {end}`, collapsed to `on {start}` for single days.
fn leave_period(record: &Record) -> Option<String> {
    let start = record.text("startDate")?;
    match record.text("endDate") {
        Some(end) if end != start => Some(format!("from {} to {}", start, end)),
        _ => Some(format!("on {}", start)),
    }
}

/// Employee view: the user's own leave requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveFormatter;

impl TransitionFormatter for LeaveFormatter {
    fn format(&self, transition: &Transition, record: &Record) -> Option<String> {
        if transition.new_status.is_empty() {
            return None;
        }
        Some(match leave_period(record) {
            Some(period) => format!("Your leave {} was {}", period, transition.new_status),
            None => format!(
                "Your leave request #{} was {}",
                transition.entity_id, transition.new_status
            ),
        })
    }

    fn load_failure(&self) -> String {
        "Failed to load leave requests.".to_string()
    }
}

/// HR view: every employee's leave requests, awaiting review.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveReviewFormatter;

impl TransitionFormatter for LeaveReviewFormatter {
    fn format(&self, transition: &Transition, record: &Record) -> Option<String> {
        if transition.new_status.is_empty() {
            return None;
        }
        let subject = match record.text("employeeUsername") {
            Some(user) => format!("{}'s leave", user),
            None => "Leave".to_string(),
        };
        Some(match leave_period(record) {
            Some(period) => format!("{} {} was {}", subject, period, transition.new_status),
            None => format!("{} #{} was {}", subject, transition.entity_id, transition.new_status),
        })
    }

    fn cold_start_summary(&self, snapshot: &[Record]) -> Option<String> {
        let pending = snapshot.iter().filter(|r| r.status() == "PENDING").count();
        (pending > 0).then(|| format!("You have {} pending leave request(s).", pending))
    }

    fn load_failure(&self) -> String {
        "Failed to load leave requests.".to_string()
    }
}

/// Admin view: attendance rows, which can be overridden by other admins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceFormatter;

impl TransitionFormatter for AttendanceFormatter {
    fn format(&self, transition: &Transition, record: &Record) -> Option<String> {
        let mut text = "Attendance".to_string();
        if let Some(name) = record.text("employeeName") {
            text.push_str(&format!(" for {}", name));
        }
        if let Some(date) = record.text("date") {
            text.push_str(&format!(" on {}", date));
        }
        if transition.previous_status.is_empty() {
            text.push_str(&format!(" marked {}", transition.new_status));
        } else {
            text.push_str(&format!(
                " changed from {} to {}",
                transition.previous_status, transition.new_status
            ));
        }
        Some(text)
    }

    fn load_failure(&self) -> String {
        "Failed to load attendance.".to_string()
    }
}

/// Formatter backed by a closure, see [`formatter_fn`].
pub struct FnFormatter<F> {
    f: F,
}

impl<F> fmt::Debug for FnFormatter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFormatter").finish_non_exhaustive()
    }
}

impl<F> TransitionFormatter for FnFormatter<F>
where
    F: Fn(&Transition, &Record) -> Option<String> + Send,
{
    fn format(&self, transition: &Transition, record: &Record) -> Option<String> {
        (self.f)(transition, record)
    }
}

/// Wrap a closure as a [`TransitionFormatter`].
///
/// ```
/// use statuswatch::template::{formatter_fn, TransitionFormatter};
/// use statuswatch::Record;
/// use statuswatch_types::{EntityId, Status, Transition};
/// use std::time::Instant;
///
/// let formatter = formatter_fn(|t, _| Some(format!("{} is now {}", t.entity_id, t.new_status)));
/// let t = Transition::new(EntityId::from(4), Status::from("A"), Status::from("B"), Instant::now());
/// assert_eq!(formatter.format(&t, &Record::default()).as_deref(), Some("4 is now B"));
/// ```
pub fn formatter_fn<F>(f: F) -> FnFormatter<F>
where
    F: Fn(&Transition, &Record) -> Option<String> + Send,
{
    FnFormatter { f }
}
