//! Poll loop glue: source → reconciler → formatter → notification queue.

use std::collections::HashMap;
use std::time::Duration;

use statuswatch_types::{EntityId, Status};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{ReentryPolicy, Settings};
use crate::notify::{Level, NotificationQueue};
use crate::reconcile::Reconciler;
use crate::source::{Record, RecordKey, Snapshot, SnapshotSource};
use crate::template::TransitionFormatter;

/// Watches one polled collection and turns status changes into notifications.
///
/// A watcher owns everything one screen needs: the source it polls, a
/// [`Reconciler`] for that stream, the screen's wording and the queue its
/// toasts go to. Drive it manually with [`tick`](Self::tick) or hand it to a
/// background task with [`spawn`](Self::spawn).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use statuswatch::{ChannelSource, NotificationQueue, Record, StatusWatcher};
/// use statuswatch::template::LeaveFormatter;
///
/// # tokio_test::block_on(async {
/// let (tx, source) = ChannelSource::create("GET /api/leaves");
/// let queue = NotificationQueue::new(Duration::from_secs(3));
/// let mut watcher = StatusWatcher::new(Box::new(source), Box::new(LeaveFormatter), queue.clone());
///
/// let leave = |status: &str| {
///     Record::new(status)
///         .with_field("id", 1)
///         .with_field("startDate", "2024-05-01")
///         .with_field("endDate", "2024-05-01")
/// };
///
/// tx.send(Some(vec![leave("PENDING")])).unwrap();
/// watcher.tick();
/// tx.send(Some(vec![leave("APPROVED")])).unwrap();
/// watcher.tick();
///
/// assert_eq!(queue.current_messages(), vec!["Your leave on 2024-05-01 was APPROVED"]);
/// # });
/// ```
#[derive(Debug)]
pub struct StatusWatcher {
    source: Box<dyn SnapshotSource>,
    reconciler: Reconciler,
    formatter: Box<dyn TransitionFormatter>,
    queue: NotificationQueue,
    key: RecordKey,
    reentry: ReentryPolicy,
    load_error: Option<String>,
}

impl StatusWatcher {
    /// Create a watcher keyed on the `id` field with the cold-start re-entry policy.
    pub fn new(
        source: Box<dyn SnapshotSource>,
        formatter: Box<dyn TransitionFormatter>,
        queue: NotificationQueue,
    ) -> Self {
        Self {
            source,
            reconciler: Reconciler::new(),
            formatter,
            queue,
            key: RecordKey::default(),
            reentry: ReentryPolicy::default(),
            load_error: None,
        }
    }

    /// Create a watcher for the stream described by `settings`.
    ///
    /// The queue is passed in so that several watchers can share one.
    pub fn from_settings(
        source: Box<dyn SnapshotSource>,
        settings: &Settings,
        queue: NotificationQueue,
    ) -> Self {
        Self::new(source, settings.stream.formatter(), queue)
            .with_key(settings.stream.record_key())
            .with_reentry(settings.reentry)
    }

    /// Use a different rule for deriving entity ids.
    pub fn with_key(mut self, key: RecordKey) -> Self {
        self.key = key;
        self
    }

    /// Set the re-entry policy applied by [`reenter`](Self::reenter).
    pub fn with_reentry(mut self, reentry: ReentryPolicy) -> Self {
        self.reentry = reentry;
        self
    }

    /// The queue notifications are pushed to.
    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }

    /// The reconciler tracking this stream.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Returns a description of the underlying source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// The error of the last failed fetch, cleared by the next successful one.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Poll the source once and notify about every status change.
    ///
    /// Returns the number of notifications enqueued. A tick without new data
    /// does nothing; a failed fetch enqueues one error notification per
    /// distinct failure and leaves the reconciler untouched.
    pub fn tick(&mut self) -> usize {
        match self.source.poll() {
            Some(snapshot) => {
                self.load_error = None;
                self.apply(snapshot)
            }
            None => self.check_source_error(),
        }
    }

    fn check_source_error(&mut self) -> usize {
        let Some(err) = self.source.error() else {
            return 0;
        };
        if self.load_error.as_deref() == Some(err) {
            return 0;
        }

        warn!(source = %self.source.description(), error = %err, "fetch failed");
        self.load_error = Some(err.to_string());
        self.queue.enqueue_with(self.formatter.load_failure(), Level::Error);
        1
    }

    fn apply(&mut self, snapshot: Snapshot) -> usize {
        let cold_start = !self.reconciler.is_primed();

        let mut keyed: HashMap<EntityId, &Record> = HashMap::with_capacity(snapshot.len());
        let mut pairs: Vec<(EntityId, Status)> = Vec::with_capacity(snapshot.len());
        for record in &snapshot {
            match self.key.entity_id(record) {
                Some(id) => {
                    // Repeated ids: the reconciler keeps the last status and
                    // every transition for the id is worded from the last record.
                    pairs.push((id.clone(), record.status()));
                    keyed.insert(id, record);
                }
                None => warn!(key = ?self.key, "skipping record without a key"),
            }
        }

        let transitions = self.reconciler.reconcile(pairs);
        debug!(
            records = snapshot.len(),
            transitions = transitions.len(),
            cold_start,
            "snapshot reconciled"
        );

        let mut enqueued = 0;
        if cold_start {
            if let Some(summary) = self.formatter.cold_start_summary(&snapshot) {
                self.queue.enqueue(summary);
                enqueued += 1;
            }
        }

        for transition in &transitions {
            let Some(record) = keyed.get(&transition.entity_id) else {
                continue;
            };
            if let Some(text) = self.formatter.format(transition, record) {
                info!(
                    id = %transition.entity_id,
                    from = %transition.previous_status,
                    to = %transition.new_status,
                    "status changed"
                );
                self.queue.enqueue(text);
                enqueued += 1;
            }
        }

        enqueued
    }

    /// Record a status the host changed itself, so it is not announced again.
    pub fn acknowledge(&mut self, id: impl Into<EntityId>, status: impl Into<Status>) {
        self.reconciler.acknowledge(id.into(), status);
    }

    /// Apply the re-entry policy when the screen is entered again.
    pub fn reenter(&mut self) {
        match self.reentry {
            ReentryPolicy::ColdStart => {
                debug!(source = %self.source.description(), "re-entered, cold start");
                self.reconciler.reset();
                self.load_error = None;
            }
            ReentryPolicy::Preserve => {
                debug!(source = %self.source.description(), "re-entered, history kept");
            }
        }
    }

    /// Run [`tick`](Self::tick) every `interval` on a background task.
    ///
    /// The first tick happens immediately. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(mut self, interval: Duration) -> WatchHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let queue = self.queue.clone();

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        self.tick();
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!(source = %self.source.description(), "watcher stopped");
            self
        });

        WatchHandle {
            stop_tx,
            task,
            queue,
        }
    }
}

/// Handle to a watcher running in the background.
///
/// Dropping the handle also stops the loop; use [`stop`](Self::stop) to get
/// the watcher back.
#[derive(Debug)]
pub struct WatchHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<StatusWatcher>,
    queue: NotificationQueue,
}

impl WatchHandle {
    /// The queue the running watcher pushes to.
    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }

    /// True once the background loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop polling and return the watcher, e.g. to re-enter the screen later.
    ///
    /// Returns `None` if the loop panicked or was aborted.
    pub async fn stop(self) -> Option<StatusWatcher> {
        let _ = self.stop_tx.send(true);
        self.task.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamKind;
    use crate::source::ChannelSource;
    use crate::template::{AttendanceFormatter, LeaveFormatter, LeaveReviewFormatter};
    use tokio::time::sleep;

    fn leave(id: i64, status: &str, start: &str, end: &str) -> Record {
        Record::new(status)
            .with_field("id", id)
            .with_field("startDate", start)
            .with_field("endDate", end)
    }

    fn leave_watcher() -> (watch::Sender<Option<Snapshot>>, StatusWatcher) {
        let (tx, source) = ChannelSource::create("test");
        let queue = NotificationQueue::new(Duration::from_secs(3));
        let watcher = StatusWatcher::new(Box::new(source), Box::new(LeaveFormatter), queue);
        (tx, watcher)
    }

    /// Test source whose next poll result and error are set by the test.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        next: Option<Snapshot>,
        error: Option<String>,
    }

    impl SnapshotSource for ScriptedSource {
        fn poll(&mut self) -> Option<Snapshot> {
            self.next.take()
        }

        fn description(&self) -> &str {
            "scripted"
        }

        fn error(&self) -> Option<&str> {
            self.error.as_deref()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cold_start_is_silent_then_changes_notify() {
        let (tx, mut watcher) = leave_watcher();

        tx.send(Some(vec![
            leave(1, "PENDING", "2024-05-01", "2024-05-01"),
            leave(2, "PENDING", "2024-05-06", "2024-05-08"),
        ]))
        .unwrap();
        assert_eq!(watcher.tick(), 0);
        assert!(watcher.queue().is_empty());

        tx.send(Some(vec![
            leave(1, "APPROVED", "2024-05-01", "2024-05-01"),
            leave(2, "REJECTED", "2024-05-06", "2024-05-08"),
            leave(3, "PENDING", "2024-06-01", "2024-06-01"),
        ]))
        .unwrap();
        assert_eq!(watcher.tick(), 2);
        assert_eq!(
            watcher.queue().current_messages(),
            vec![
                "Your leave on 2024-05-01 was APPROVED",
                "Your leave from 2024-05-06 to 2024-05-08 was REJECTED",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tick_without_new_data_does_nothing() {
        let (tx, mut watcher) = leave_watcher();
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();

        assert_eq!(watcher.tick(), 0);
        assert!(watcher.reconciler().is_primed());
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledged_change_is_not_announced() {
        let (tx, mut watcher) = leave_watcher();
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();

        watcher.acknowledge(1, "APPROVED");
        tx.send(Some(vec![leave(1, "APPROVED", "2024-05-01", "2024-05-01")])).unwrap();

        assert_eq!(watcher.tick(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_expire_after_ttl() {
        let (tx, mut watcher) = leave_watcher();
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();
        tx.send(Some(vec![leave(1, "APPROVED", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();
        assert_eq!(watcher.queue().len(), 1);

        sleep(Duration::from_millis(3100)).await;
        assert!(watcher.queue().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn review_stream_summarizes_pending_on_cold_start_only() {
        let (tx, source) = ChannelSource::create("hr");
        let queue = NotificationQueue::new(Duration::from_millis(3500));
        let mut watcher = StatusWatcher::new(Box::new(source), Box::new(LeaveReviewFormatter), queue);

        let first = vec![
            leave(1, "PENDING", "2024-05-01", "2024-05-01"),
            leave(2, "PENDING", "2024-05-02", "2024-05-02"),
            leave(3, "APPROVED", "2024-05-03", "2024-05-03"),
        ];
        tx.send(Some(first.clone())).unwrap();
        assert_eq!(watcher.tick(), 1);
        assert_eq!(
            watcher.queue().current_messages(),
            vec!["You have 2 pending leave request(s)."]
        );

        tx.send(Some(first)).unwrap();
        assert_eq!(watcher.tick(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn attendance_uses_composite_key() {
        let (tx, source) = ChannelSource::create("admin");
        let queue = NotificationQueue::new(Duration::from_secs(3));
        let settings = Settings {
            stream: StreamKind::Attendance,
            ..Settings::default()
        };
        let mut watcher = StatusWatcher::from_settings(Box::new(source), &settings, queue);

        let row = |employee: i64, date: &str, status: &str| {
            Record::new(status)
                .with_field("employeeId", employee)
                .with_field("employeeName", format!("emp{}", employee))
                .with_field("date", date)
        };

        tx.send(Some(vec![row(7, "2024-05-01", "PRESENT"), row(7, "2024-05-02", "PRESENT")]))
            .unwrap();
        watcher.tick();

        tx.send(Some(vec![row(7, "2024-05-01", "PRESENT"), row(7, "2024-05-02", "ABSENT")]))
            .unwrap();
        assert_eq!(watcher.tick(), 1);
        assert_eq!(
            watcher.queue().current_messages(),
            vec!["Attendance for emp7 on 2024-05-02 changed from PRESENT to ABSENT"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn records_without_key_are_skipped() {
        let (tx, mut watcher) = leave_watcher();
        tx.send(Some(vec![Record::new("PENDING"), leave(1, "PENDING", "2024-05-01", "2024-05-01")]))
            .unwrap();
        watcher.tick();

        assert_eq!(watcher.reconciler().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_notifies_once_per_error() {
        let queue = NotificationQueue::new(Duration::from_secs(60));
        let source = ScriptedSource {
            next: None,
            error: Some("Read error: connection refused".to_string()),
        };
        let mut watcher = StatusWatcher::new(Box::new(source), Box::new(AttendanceFormatter), queue);

        assert_eq!(watcher.tick(), 1);
        assert_eq!(watcher.tick(), 0);
        assert_eq!(watcher.load_error(), Some("Read error: connection refused"));

        let notifications = watcher.queue().notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].text, "Failed to load attendance.");
        assert_eq!(notifications[0].level, Level::Error);
        assert!(!watcher.reconciler().is_primed());
    }

    #[tokio::test(start_paused = true)]
    async fn reenter_cold_start_forgets_history() {
        let (tx, mut watcher) = leave_watcher();
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();

        watcher.reenter();
        tx.send(Some(vec![leave(1, "APPROVED", "2024-05-01", "2024-05-01")])).unwrap();

        assert_eq!(watcher.tick(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reenter_preserve_reports_changes_made_while_away() {
        let (tx, watcher) = leave_watcher();
        let mut watcher = watcher.with_reentry(ReentryPolicy::Preserve);
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();

        watcher.reenter();
        tx.send(Some(vec![leave(1, "APPROVED", "2024-05-01", "2024-05-01")])).unwrap();

        assert_eq!(watcher.tick(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_id_is_worded_from_its_last_record() {
        let (tx, mut watcher) = leave_watcher();
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        watcher.tick();

        tx.send(Some(vec![
            leave(1, "APPROVED", "2024-05-01", "2024-05-01"),
            leave(1, "REJECTED", "2024-05-02", "2024-05-02"),
        ]))
        .unwrap();
        assert_eq!(watcher.tick(), 2);
        assert_eq!(
            watcher.queue().current_messages(),
            vec![
                "Your leave on 2024-05-02 was APPROVED",
                "Your leave on 2024-05-02 was REJECTED",
            ]
        );
        assert_eq!(
            watcher.reconciler().status(&EntityId::from(1)),
            Some(&Status::from("REJECTED"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_sees_notifications_shorter_than_a_poll() {
        let (tx, source) = ChannelSource::create("test");
        let queue = NotificationQueue::new(Duration::from_millis(100));
        let mut events = queue.subscribe();
        let watcher = StatusWatcher::new(Box::new(source), Box::new(LeaveFormatter), queue.clone());

        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();
        let handle = watcher.spawn(Duration::from_secs(1));
        sleep(Duration::from_millis(10)).await;

        tx.send(Some(vec![leave(1, "APPROVED", "2024-05-01", "2024-05-01")])).unwrap();
        sleep(Duration::from_millis(1500)).await;

        // Long gone from the queue, still delivered to the subscriber.
        assert!(queue.is_empty());
        let notification = events.recv().await.unwrap();
        assert_eq!(notification.text, "Your leave on 2024-05-01 was APPROVED");

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_polls_until_stopped() {
        let (tx, watcher) = leave_watcher();
        tx.send(Some(vec![leave(1, "PENDING", "2024-05-01", "2024-05-01")])).unwrap();

        let handle = watcher.spawn(Duration::from_secs(15));
        let queue = handle.queue().clone();

        // First tick runs immediately and primes the reconciler.
        sleep(Duration::from_millis(10)).await;

        tx.send(Some(vec![leave(1, "REJECTED", "2024-05-01", "2024-05-01")])).unwrap();
        sleep(Duration::from_secs(15)).await;
        assert_eq!(queue.current_messages(), vec!["Your leave on 2024-05-01 was REJECTED"]);

        let watcher = handle.stop().await.unwrap();
        assert!(watcher.reconciler().is_primed());
        assert_eq!(watcher.reconciler().status(&EntityId::from(1)), Some(&Status::from("REJECTED")));
    }
}
