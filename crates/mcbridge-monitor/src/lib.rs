#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Task completion monitor.
//!
//! Polls the transfer service for recently succeeded tasks, recovers the
//! routing id of each completed upload from its staging destination path and
//! notifies the ingestion pipeline once per routing id.
//!
//! Layout: `monitor.rs` (poll loop, cycle reports, lifecycle handle),
//! `correlate.rs` (routing-id extraction), `ledger.rs` (watermark and dedup
//! set), `settings.rs` (tunables).

pub mod correlate;
pub mod ledger;
pub mod monitor;
pub mod settings;

pub use correlate::{Correlation, CorrelationMiss, correlate, routing_id};
pub use ledger::{TaskLedger, initial_watermark};
pub use monitor::{
    CycleReport, MonitorHandle, MonitorState, SkipReason, TaskCompletionMonitor, TaskOutcome,
};
pub use settings::{
    DEFAULT_LOOKBACK_DAYS, DEFAULT_POLL_INTERVAL, DEFAULT_TASK_LIMIT, MonitorSettings,
};
