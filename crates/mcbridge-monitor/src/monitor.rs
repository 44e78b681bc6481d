//! Poll loop reconciling completed transfer tasks with the upload pipeline.

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use mcbridge_events::{Event, EventBus};
use mcbridge_telemetry::Metrics;
use mcbridge_transfer_core::{Task, TaskFilter, TransferService, UploadPipeline};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::correlate::{Correlation, CorrelationMiss, correlate};
use crate::ledger::TaskLedger;
use crate::settings::MonitorSettings;

const HEALTH_COMPONENT: &str = "task_monitor";

/// Lifecycle of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Spawned but the loop has not begun.
    Idle,
    /// Polling.
    Running,
    /// Cancellation observed; the loop has exited.
    Stopped,
}

/// Why a task did not result in a hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Completion time is not RFC 3339.
    InvalidCompletionTime,
    /// Completed at or before the watermark.
    BeforeWatermark,
    /// Transfer items could not be fetched.
    FetchFailed,
    /// The task moved no files.
    NoTransfers,
    /// The task moved files out of the staging endpoint.
    Download,
    /// The destination path does not follow the staging schema.
    MalformedPath,
    /// The routing id was handed off earlier.
    AlreadyHandled,
}

impl SkipReason {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCompletionTime => "invalid_completion_time",
            Self::BeforeWatermark => "before_watermark",
            Self::FetchFailed => "fetch_failed",
            Self::NoTransfers => "no_transfers",
            Self::Download => "download",
            Self::MalformedPath => "malformed_path",
            Self::AlreadyHandled => "already_handled",
        }
    }

    const fn admitted(self) -> bool {
        !matches!(self, Self::InvalidCompletionTime | Self::BeforeWatermark)
    }
}

/// Result of processing one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// No hand-off was attempted.
    Skipped(SkipReason),
    /// The pipeline accepted the routing id.
    HandedOff(String),
    /// The pipeline rejected the routing id; it stays marked as handled.
    HandoffFailed(String),
}

/// Summary of a single poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The task query failed and the cycle was abandoned.
    pub query_failed: bool,
    /// Tasks returned by the query.
    pub tasks_seen: usize,
    /// Tasks that passed the watermark.
    pub tasks_admitted: usize,
    /// Routing ids accepted by the pipeline, in order.
    pub handed_off: Vec<String>,
    /// Routing ids the pipeline rejected, in order.
    pub handoff_failures: Vec<String>,
    /// Skipped tasks per reason.
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Cancellation stopped the cycle before every task was processed.
    pub interrupted: bool,
}

impl CycleReport {
    /// Tasks skipped for `reason`.
    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Skipped(reason) => {
                if reason.admitted() {
                    self.tasks_admitted += 1;
                }
                *self.skipped.entry(reason).or_insert(0) += 1;
            }
            TaskOutcome::HandedOff(routing_id) => {
                self.tasks_admitted += 1;
                self.handed_off.push(routing_id);
            }
            TaskOutcome::HandoffFailed(routing_id) => {
                self.tasks_admitted += 1;
                self.handoff_failures.push(routing_id);
            }
        }
    }
}

/// Watches one transfer endpoint for completed uploads and notifies the
/// ingestion pipeline once per routing id.
pub struct TaskCompletionMonitor {
    transfers: Arc<dyn TransferService>,
    pipeline: Arc<dyn UploadPipeline>,
    settings: MonitorSettings,
    ledger: TaskLedger,
    events: Option<EventBus>,
    metrics: Option<Metrics>,
    degraded: bool,
}

impl TaskCompletionMonitor {
    /// Monitor reading from `transfers` and notifying `pipeline`.
    #[must_use]
    pub fn new(
        transfers: Arc<dyn TransferService>,
        pipeline: Arc<dyn UploadPipeline>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            transfers,
            pipeline,
            settings,
            ledger: TaskLedger::new(),
            events: None,
            metrics: None,
            degraded: false,
        }
    }

    /// Publish lifecycle and health events on `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Report cycle, skip and hand-off counters to `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Settings the monitor was built with.
    #[must_use]
    pub const fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Watermark and dedup state.
    #[must_use]
    pub const fn ledger(&self) -> &TaskLedger {
        &self.ledger
    }

    /// Spawn the poll loop. Consuming the monitor guarantees a single loop
    /// per instance; cancel `cancel` (or call [`MonitorHandle::stop`]) to end it.
    #[must_use]
    pub fn start(self, cancel: CancellationToken) -> MonitorHandle {
        let (state_tx, state_rx) = watch::channel(MonitorState::Idle);
        info!(
            endpoint_id = %self.settings.endpoint_id,
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "starting task completion monitor"
        );
        let join = tokio::spawn(self.run(cancel.clone(), state_tx));
        MonitorHandle {
            state: state_rx,
            cancel,
            join,
        }
    }

    async fn run(mut self, cancel: CancellationToken, state: watch::Sender<MonitorState>) {
        state.send_replace(MonitorState::Running);
        self.publish(Event::MonitorStarted {
            endpoint_id: self.settings.endpoint_id.clone(),
        });

        while !cancel.is_cancelled() {
            let report = self.poll_once(&cancel).await;
            if report.interrupted {
                break;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = sleep(self.settings.poll_interval) => {}
            }
        }

        info!(endpoint_id = %self.settings.endpoint_id, "task completion monitor stopped");
        self.publish(Event::MonitorStopped {
            endpoint_id: self.settings.endpoint_id.clone(),
        });
        state.send_replace(MonitorState::Stopped);
    }

    /// Run one poll cycle.
    ///
    /// A failed task query abandons the cycle without touching the ledger.
    /// `cancel` is checked after every task; in-flight calls are never
    /// interrupted.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        if let Some(metrics) = &self.metrics {
            metrics.inc_poll_cycle();
        }

        let filter = TaskFilter::recent_succeeded(
            Utc::now(),
            self.settings.lookback,
            self.settings.task_limit,
        );
        let tasks = match self
            .transfers
            .list_recent_succeeded_tasks(&self.settings.endpoint_id, &filter)
            .await
        {
            Ok(tasks) => {
                self.mark_recovered();
                tasks
            }
            Err(err) => {
                let detail = describe(&err);
                warn!(
                    endpoint_id = %self.settings.endpoint_id,
                    operation = err.operation(),
                    error = %detail,
                    "task query failed; abandoning poll cycle"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_poll_failure();
                }
                self.publish(Event::CycleFailed {
                    message: detail.clone(),
                });
                self.mark_degraded(&detail);
                report.query_failed = true;
                return report;
            }
        };

        report.tasks_seen = tasks.len();
        for task in &tasks {
            let outcome = self.process_task(task).await;
            if let (Some(metrics), TaskOutcome::Skipped(reason)) = (&self.metrics, &outcome) {
                metrics.inc_task_skipped(reason.as_str());
            }
            report.record(outcome);

            if cancel.is_cancelled() {
                info!(
                    endpoint_id = %self.settings.endpoint_id,
                    "cancellation observed; stopping poll cycle early"
                );
                report.interrupted = true;
                break;
            }
        }

        debug!(
            endpoint_id = %self.settings.endpoint_id,
            tasks_seen = report.tasks_seen,
            tasks_admitted = report.tasks_admitted,
            handed_off = report.handed_off.len(),
            handoff_failures = report.handoff_failures.len(),
            "poll cycle complete"
        );
        report
    }

    async fn process_task(&mut self, task: &Task) -> TaskOutcome {
        let task_id = task.task_id.as_str();
        let completed_at = match task.completed_at() {
            Ok(at) => at,
            Err(err) => {
                warn!(
                    task_id,
                    completion_time = %task.completion_time,
                    error = %err,
                    "skipping task with unparsable completion time"
                );
                return TaskOutcome::Skipped(SkipReason::InvalidCompletionTime);
            }
        };
        if !self.ledger.admits(completed_at) {
            return TaskOutcome::Skipped(SkipReason::BeforeWatermark);
        }

        let items = match self
            .transfers
            .list_successful_transfer_items(task_id, 0)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    task_id,
                    operation = err.operation(),
                    error = %describe(&err),
                    "failed to list successful transfers"
                );
                return TaskOutcome::Skipped(SkipReason::FetchFailed);
            }
        };

        let correlation = match correlate(&items) {
            Ok(correlation) => correlation,
            Err(CorrelationMiss::NoItems) => {
                return TaskOutcome::Skipped(SkipReason::NoTransfers);
            }
            Err(CorrelationMiss::Download) => {
                debug!(task_id, "ignoring download task");
                return TaskOutcome::Skipped(SkipReason::Download);
            }
            Err(CorrelationMiss::MalformedPath { destination_path }) => {
                warn!(
                    task_id,
                    destination_path = %destination_path,
                    "invalid staging destination path"
                );
                return TaskOutcome::Skipped(SkipReason::MalformedPath);
            }
        };

        if !self.ledger.record(correlation.routing_id.clone()) {
            return TaskOutcome::Skipped(SkipReason::AlreadyHandled);
        }
        if let Some(metrics) = &self.metrics {
            metrics.set_dedup_entries(self.ledger.len());
        }
        self.hand_off(task_id, correlation).await
    }

    async fn hand_off(&self, task_id: &str, correlation: Correlation) -> TaskOutcome {
        let Correlation {
            routing_id,
            destination_path,
            scope,
        } = correlation;
        info!(
            task_id,
            routing_id = %routing_id,
            scope = %scope.scope_path(),
            destination_path = %destination_path,
            "processing completed upload"
        );
        match self.pipeline.on_upload_ready(&routing_id).await {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_handoff("ok");
                }
                TaskOutcome::HandedOff(routing_id)
            }
            Err(err) => {
                warn!(
                    task_id,
                    routing_id = %routing_id,
                    error = %describe(&err),
                    "upload hand-off failed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_handoff("failed");
                }
                TaskOutcome::HandoffFailed(routing_id)
            }
        }
    }

    fn publish(&self, event: Event) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    fn mark_degraded(&mut self, detail: &str) {
        if self.degraded {
            warn!(component = HEALTH_COMPONENT, detail = %detail, "component still degraded");
            return;
        }
        self.degraded = true;
        self.publish(Event::HealthChanged {
            degraded: vec![HEALTH_COMPONENT.to_string()],
        });
        warn!(component = HEALTH_COMPONENT, detail = %detail, "component degraded");
    }

    fn mark_recovered(&mut self) {
        if !self.degraded {
            return;
        }
        self.degraded = false;
        self.publish(Event::HealthChanged {
            degraded: Vec::new(),
        });
        info!(component = HEALTH_COMPONENT, "component recovered");
    }
}

/// Handle to a running monitor loop.
pub struct MonitorHandle {
    state: watch::Receiver<MonitorState>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Token that stops the loop when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns the join error if the loop task panicked.
    pub async fn stop(self) -> Result<(), JoinError> {
        self.cancel.cancel();
        self.join.await
    }

    /// Wait for the loop to exit without cancelling it.
    ///
    /// # Errors
    ///
    /// Returns the join error if the loop task panicked.
    pub async fn join(self) -> Result<(), JoinError> {
        self.join.await
    }
}

fn describe(err: &(dyn Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};
    use mcbridge_events::EventEnvelope;
    use mcbridge_test_support::fixtures::{download_from, staged_upload, task, upload_to};
    use mcbridge_test_support::mocks::{RecordingPipeline, ScriptedTransferService};
    use mcbridge_transfer_core::{TaskStatus, TransferResult};

    const RECENT: &str = "2024-05-02T10:00:00Z";

    struct Harness {
        service: Arc<ScriptedTransferService>,
        pipeline: Arc<RecordingPipeline>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                service: Arc::new(ScriptedTransferService::new()),
                pipeline: Arc::new(RecordingPipeline::new()),
            }
        }

        fn monitor(&self) -> TaskCompletionMonitor {
            TaskCompletionMonitor::new(
                self.service.clone(),
                self.pipeline.clone(),
                MonitorSettings::new("ep-1"),
            )
        }
    }

    fn events_of(bus: &EventBus) -> Vec<Event> {
        bus.backlog_since(0)
            .into_iter()
            .map(|EventEnvelope { event, .. }| event)
            .collect()
    }

    #[tokio::test]
    async fn query_uses_endpoint_and_recent_succeeded_filter() {
        let harness = Harness::new();
        let mut monitor = TaskCompletionMonitor::new(
            harness.service.clone(),
            harness.pipeline.clone(),
            MonitorSettings::new("ep-9").with_task_limit(250),
        );

        monitor.poll_once(&CancellationToken::new()).await;

        let filters = harness.service.filters();
        assert_eq!(filters.len(), 1);
        let (endpoint_id, filter) = &filters[0];
        assert_eq!(endpoint_id, "ep-9");
        assert_eq!(filter.status, TaskStatus::Succeeded);
        assert_eq!(filter.order_by.as_str(), "completion_time ASC");
        assert_eq!(filter.limit, 250);
        let today = Utc::now().date_naive();
        assert!(filter.completed_after <= today - TimeDelta::days(6));
        assert!(filter.completed_after >= today - TimeDelta::days(8));
    }

    #[tokio::test]
    async fn same_routing_id_is_handed_off_once_across_cycles() {
        let harness = Harness::new();
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness
            .service
            .set_items("t-1", vec![staged_upload("globus", 5, 9, "data/f.txt")]);
        let mut monitor = harness.monitor();
        let cancel = CancellationToken::new();

        let first = monitor.poll_once(&cancel).await;
        let second = monitor.poll_once(&cancel).await;

        assert_eq!(first.handed_off, vec!["5"]);
        assert!(second.handed_off.is_empty());
        assert_eq!(second.skipped(SkipReason::AlreadyHandled), 1);
        assert_eq!(harness.pipeline.routing_ids(), vec!["5"]);
        assert!(monitor.ledger().contains("5"));
    }

    #[tokio::test]
    async fn distinct_tasks_sharing_a_routing_id_collapse_within_a_cycle() {
        let harness = Harness::new();
        harness
            .service
            .push_tasks(vec![task("t-1", RECENT), task("t-2", RECENT)]);
        harness
            .service
            .set_items("t-1", vec![staged_upload("globus", 5, 9, "a.txt")]);
        harness
            .service
            .set_items("t-2", vec![staged_upload("globus", 5, 9, "b.txt")]);

        let report = harness.monitor().poll_once(&CancellationToken::new()).await;

        assert_eq!(report.handed_off, vec!["5"]);
        assert_eq!(report.skipped(SkipReason::AlreadyHandled), 1);
        assert_eq!(report.tasks_admitted, 2);
    }

    #[tokio::test]
    async fn downloads_never_reach_the_pipeline() {
        let harness = Harness::new();
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness.service.set_items(
            "t-1",
            vec![
                download_from("/globus/5/9/f.txt"),
                staged_upload("globus", 5, 9, "f.txt"),
            ],
        );

        let report = harness.monitor().poll_once(&CancellationToken::new()).await;

        assert_eq!(report.skipped(SkipReason::Download), 1);
        assert!(harness.pipeline.routing_ids().is_empty());
    }

    #[tokio::test]
    async fn malformed_path_does_not_stop_the_cycle() {
        let harness = Harness::new();
        harness
            .service
            .push_tasks(vec![task("t-bad", RECENT), task("t-good", RECENT)]);
        harness.service.set_items("t-bad", vec![upload_to("/globus/5")]);
        harness
            .service
            .set_items("t-good", vec![upload_to("/globus/12/3/file.txt")]);

        let report = harness.monitor().poll_once(&CancellationToken::new()).await;

        assert_eq!(report.skipped(SkipReason::MalformedPath), 1);
        assert_eq!(report.handed_off, vec!["12"]);
        assert_eq!(harness.pipeline.routing_ids(), vec!["12"]);
    }

    #[tokio::test]
    async fn tasks_at_or_before_watermark_are_not_correlated() {
        let harness = Harness::new();
        harness.service.push_tasks(vec![
            task("t-old", "2001-01-01T00:00:00Z"),
            task("t-edge", "2009-11-10T23:00:00Z"),
            task("t-garbled", "yesterday"),
        ]);
        harness
            .service
            .set_items("t-old", vec![staged_upload("globus", 1, 1, "f")]);

        let report = harness.monitor().poll_once(&CancellationToken::new()).await;

        assert_eq!(report.skipped(SkipReason::BeforeWatermark), 2);
        assert_eq!(report.skipped(SkipReason::InvalidCompletionTime), 1);
        assert_eq!(report.tasks_admitted, 0);
        assert!(harness.service.item_calls().is_empty());
        assert!(harness.pipeline.routing_ids().is_empty());
    }

    #[tokio::test]
    async fn item_fetch_failure_skips_only_that_task() {
        let harness = Harness::new();
        harness.service.push_tasks(vec![
            task("t-1", RECENT),
            task("t-2", RECENT),
            task("t-3", RECENT),
        ]);
        harness.service.fail_items("t-1");
        harness
            .service
            .set_items("t-3", vec![staged_upload("globus", 7, 2, "x")]);

        let report = harness.monitor().poll_once(&CancellationToken::new()).await;

        assert_eq!(report.skipped(SkipReason::FetchFailed), 1);
        assert_eq!(report.skipped(SkipReason::NoTransfers), 1);
        assert_eq!(report.handed_off, vec!["7"]);
        assert_eq!(harness.service.item_calls(), vec!["t-1", "t-2", "t-3"]);
        assert_eq!(harness.service.item_offsets(), vec![0, 0, 0]);
    }

    #[tokio::test]
    async fn rejected_hand_off_is_not_retried() {
        let harness = Harness::new();
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness
            .service
            .set_items("t-1", vec![staged_upload("globus", 5, 9, "f")]);
        harness.pipeline.fail_for("5");
        let mut monitor = harness.monitor();
        let cancel = CancellationToken::new();

        let first = monitor.poll_once(&cancel).await;
        let second = monitor.poll_once(&cancel).await;

        assert_eq!(first.handoff_failures, vec!["5"]);
        assert_eq!(second.skipped(SkipReason::AlreadyHandled), 1);
        assert_eq!(harness.pipeline.routing_ids(), vec!["5"]);
    }

    #[tokio::test]
    async fn query_failure_leaves_ledger_untouched_and_flags_health() {
        let harness = Harness::new();
        let bus = EventBus::with_capacity(16);
        harness.service.push_failure("service unavailable");
        harness.service.push_failure("still unavailable");
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness
            .service
            .set_items("t-1", vec![staged_upload("globus", 5, 9, "f")]);
        let mut monitor = harness.monitor().with_events(bus.clone());
        let cancel = CancellationToken::new();

        let failed = monitor.poll_once(&cancel).await;
        assert!(failed.query_failed);
        assert!(monitor.ledger().is_empty());
        assert!(monitor.poll_once(&cancel).await.query_failed);
        let recovered = monitor.poll_once(&cancel).await;
        assert_eq!(recovered.handed_off, vec!["5"]);

        let health: Vec<Vec<String>> = events_of(&bus)
            .into_iter()
            .filter_map(|event| match event {
                Event::HealthChanged { degraded } => Some(degraded),
                _ => None,
            })
            .collect();
        assert_eq!(health, vec![vec![HEALTH_COMPONENT.to_string()], Vec::new()]);

        let failures: Vec<String> = events_of(&bus)
            .into_iter()
            .filter_map(|event| match event {
                Event::CycleFailed { message } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(
            failures,
            vec![
                "transfer service task_list request failed for ep-1: service unavailable",
                "transfer service task_list request failed for ep-1: still unavailable",
            ]
        );
    }

    struct CancelOnHandoff {
        cancel: CancellationToken,
        seen: RecordingPipeline,
    }

    #[async_trait]
    impl UploadPipeline for CancelOnHandoff {
        async fn on_upload_ready(&self, routing_id: &str) -> TransferResult<()> {
            self.cancel.cancel();
            self.seen.on_upload_ready(routing_id).await
        }
    }

    #[tokio::test]
    async fn cancellation_is_observed_after_the_current_task() {
        let service = Arc::new(ScriptedTransferService::new());
        service.push_tasks(vec![task("t-1", RECENT), task("t-2", RECENT)]);
        service.set_items("t-1", vec![staged_upload("globus", 1, 1, "f")]);
        service.set_items("t-2", vec![staged_upload("globus", 2, 2, "f")]);
        let cancel = CancellationToken::new();
        let pipeline = Arc::new(CancelOnHandoff {
            cancel: cancel.clone(),
            seen: RecordingPipeline::new(),
        });
        let mut monitor =
            TaskCompletionMonitor::new(service.clone(), pipeline.clone(), MonitorSettings::new("ep"));

        let report = monitor.poll_once(&cancel).await;

        assert!(report.interrupted);
        assert_eq!(report.handed_off, vec!["1"]);
        assert_eq!(pipeline.seen.routing_ids(), vec!["1"]);
        assert_eq!(service.item_calls(), vec!["t-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_polling_after_a_failed_cycle() {
        let harness = Harness::new();
        harness.service.push_failure("timeout");
        harness.service.push_tasks(vec![task("t-1", RECENT)]);
        harness
            .service
            .set_items("t-1", vec![staged_upload("globus", 5, 9, "f")]);
        let bus = EventBus::with_capacity(32);
        let monitor = TaskCompletionMonitor::new(
            harness.service.clone(),
            harness.pipeline.clone(),
            MonitorSettings::new("ep-1").with_poll_interval(Duration::from_secs(10)),
        )
        .with_events(bus.clone());

        let handle = monitor.start(CancellationToken::new());
        sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.state(), MonitorState::Running);
        assert_eq!(harness.service.list_calls(), 1);
        assert!(harness.pipeline.routing_ids().is_empty());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(harness.service.list_calls(), 2);
        assert_eq!(harness.pipeline.routing_ids(), vec!["5"]);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(harness.service.list_calls(), 3);

        handle.stop().await.expect("loop exits cleanly");
        let events = events_of(&bus);
        assert_eq!(
            events.first(),
            Some(&Event::MonitorStarted {
                endpoint_id: "ep-1".into()
            })
        );
        assert_eq!(
            events.last(),
            Some(&Event::MonitorStopped {
                endpoint_id: "ep-1".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_during_sleep_stops_the_loop() {
        let harness = Harness::new();
        let monitor = harness.monitor();
        let handle = monitor.start(CancellationToken::new());
        let token = handle.cancel_token();
        let mut state = handle.state.clone();

        sleep(Duration::from_secs(1)).await;
        token.cancel();
        state
            .wait_for(|current| *current == MonitorState::Stopped)
            .await
            .expect("state channel open");
        assert_eq!(handle.state(), MonitorState::Stopped);
        assert_eq!(harness.service.list_calls(), 1);
        handle.join().await.expect("loop exits cleanly");
    }

    #[tokio::test]
    async fn metrics_track_cycles_and_dedup_size() {
        let harness = Harness::new();
        let metrics = Metrics::new().expect("metrics registry");
        harness.service.push_failure("boom");
        harness.service.push_tasks(vec![task("t-1", RECENT), task("t-2", "bad")]);
        harness
            .service
            .set_items("t-1", vec![staged_upload("globus", 5, 9, "f")]);
        let mut monitor = harness.monitor().with_metrics(metrics.clone());
        let cancel = CancellationToken::new();

        monitor.poll_once(&cancel).await;
        monitor.poll_once(&cancel).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.poll_cycles_total, 2);
        assert_eq!(snapshot.poll_failures_total, 1);
        assert_eq!(snapshot.dedup_entries, 1);
        let rendered = metrics.render().expect("render metrics");
        assert!(rendered.contains("monitor_tasks_skipped_total{reason=\"invalid_completion_time\"} 1"));
        assert!(rendered.contains("monitor_handoffs_total{outcome=\"ok\"} 1"));
    }

    #[test]
    fn describe_renders_the_source_chain() {
        let err = mcbridge_transfer_core::TransferError::service("task_list", "ep", "timed out");
        assert_eq!(
            describe(&err),
            "transfer service task_list request failed for ep: timed out"
        );
    }
}
