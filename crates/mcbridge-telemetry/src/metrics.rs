//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges the task monitor and event bus report.

use std::sync::Arc;

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder, core::Collector,
};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    poll_cycles_total: IntCounter,
    poll_failures_total: IntCounter,
    tasks_skipped_total: IntCounterVec,
    handoffs_total: IntCounterVec,
    dedup_entries: IntGauge,
    events_emitted_total: IntCounterVec,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Poll cycles started.
    pub poll_cycles_total: u64,
    /// Poll cycles abandoned because the task query failed.
    pub poll_failures_total: u64,
    /// Routing ids currently held in the dedup set.
    pub dedup_entries: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let poll_cycles_total = IntCounter::with_opts(Opts::new(
            "monitor_poll_cycles_total",
            "Task monitor poll cycles started",
        ))
        .map_err(|source| collector("monitor_poll_cycles_total", source))?;
        let poll_failures_total = IntCounter::with_opts(Opts::new(
            "monitor_poll_failures_total",
            "Poll cycles abandoned after a failed task query",
        ))
        .map_err(|source| collector("monitor_poll_failures_total", source))?;
        let tasks_skipped_total = IntCounterVec::new(
            Opts::new(
                "monitor_tasks_skipped_total",
                "Completed tasks skipped by the monitor, by reason",
            ),
            &["reason"],
        )
        .map_err(|source| collector("monitor_tasks_skipped_total", source))?;
        let handoffs_total = IntCounterVec::new(
            Opts::new(
                "monitor_handoffs_total",
                "Upload hand-offs to the ingestion pipeline, by outcome",
            ),
            &["outcome"],
        )
        .map_err(|source| collector("monitor_handoffs_total", source))?;
        let dedup_entries = IntGauge::with_opts(Opts::new(
            "monitor_dedup_entries",
            "Routing ids remembered by the monitor",
        ))
        .map_err(|source| collector("monitor_dedup_entries", source))?;
        let events_emitted_total = IntCounterVec::new(
            Opts::new("events_emitted_total", "Domain events emitted by type"),
            &["type"],
        )
        .map_err(|source| collector("events_emitted_total", source))?;

        register(&registry, "monitor_poll_cycles_total", &poll_cycles_total)?;
        register(&registry, "monitor_poll_failures_total", &poll_failures_total)?;
        register(&registry, "monitor_tasks_skipped_total", &tasks_skipped_total)?;
        register(&registry, "monitor_handoffs_total", &handoffs_total)?;
        register(&registry, "monitor_dedup_entries", &dedup_entries)?;
        register(&registry, "events_emitted_total", &events_emitted_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                poll_cycles_total,
                poll_failures_total,
                tasks_skipped_total,
                handoffs_total,
                dedup_entries,
                events_emitted_total,
            }),
        })
    }

    /// Count a started poll cycle.
    pub fn inc_poll_cycle(&self) {
        self.inner.poll_cycles_total.inc();
    }

    /// Count a poll cycle abandoned after a failed query.
    pub fn inc_poll_failure(&self) {
        self.inner.poll_failures_total.inc();
    }

    /// Count a skipped task for `reason`.
    pub fn inc_task_skipped(&self, reason: &str) {
        self.inner
            .tasks_skipped_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Count a hand-off attempt with its `outcome` (`ok` or `failed`).
    pub fn inc_handoff(&self, outcome: &str) {
        self.inner.handoffs_total.with_label_values(&[outcome]).inc();
    }

    /// Record the dedup set size.
    pub fn set_dedup_entries(&self, count: usize) {
        self.inner
            .dedup_entries
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            poll_cycles_total: self.inner.poll_cycles_total.get(),
            poll_failures_total: self.inner.poll_failures_total.get(),
            dedup_entries: self.inner.dedup_entries.get(),
        }
    }
}

fn collector(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsCollector { name, source }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
