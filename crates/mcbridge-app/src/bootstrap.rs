use std::future::Future;
use std::sync::Arc;

use mcbridge_config::BridgeConfig;
use mcbridge_events::{Event, EventBus, EventEnvelope, EventPipeline};
use mcbridge_globus::GlobusClient;
use mcbridge_monitor::{MonitorSettings, TaskCompletionMonitor};
use mcbridge_telemetry::{
    GlobalContextGuard, LogFormat, LoggingConfig, Metrics, build_sha, init_logging,
};
use mcbridge_transfer_core::{TransferService, UploadPipeline};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the bridge.
pub(crate) struct BootstrapDependencies {
    config: BridgeConfig,
    transfers: Arc<dyn TransferService>,
    events: EventBus,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            BridgeConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        let client = GlobusClient::new(
            config.globus_base_url.clone(),
            config.globus_token.clone(),
            config.http_timeout,
        )
        .map_err(|err| AppError::globus("globus_client.new", err))?;
        Self::with_transfers(config, Arc::new(client))
    }

    pub(crate) fn with_transfers(
        config: BridgeConfig,
        transfers: Arc<dyn TransferService>,
    ) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            transfers,
            events: EventBus::new(),
            telemetry,
        })
    }
}

/// Entry point for the bridge boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging or client construction fails,
/// or if a background task does not shut down cleanly.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    init_logging(&logging_config(&dependencies.config))
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    run_app_with(dependencies, shutdown_signal()).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
pub(crate) async fn run_app_with<F>(
    dependencies: BootstrapDependencies,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    let _context = GlobalContextGuard::new("monitor");

    let BootstrapDependencies {
        config,
        transfers,
        events,
        telemetry,
    } = dependencies;

    info!(
        endpoint_id = %config.endpoint_id,
        base_url = %config.globus_base_url,
        "mcbridge starting"
    );

    let logger_cancel = CancellationToken::new();
    let logger = spawn_event_logger(&events, telemetry.clone(), logger_cancel.clone());

    let pipeline: Arc<dyn UploadPipeline> = Arc::new(EventPipeline::new(events.clone()));
    let monitor = TaskCompletionMonitor::new(transfers, pipeline, monitor_settings(&config))
        .with_events(events.clone())
        .with_metrics(telemetry.clone());
    let handle = monitor.start(CancellationToken::new());

    shutdown.await;
    info!("shutdown requested");

    handle
        .stop()
        .await
        .map_err(|err| AppError::join("monitor.join", err))?;
    // The logger outlives the monitor so the final lifecycle event is drained.
    logger_cancel.cancel();
    logger
        .await
        .map_err(|err| AppError::join("event_logger.join", err))?;

    let snapshot = telemetry.snapshot();
    info!(
        poll_cycles = snapshot.poll_cycles_total,
        poll_failures = snapshot.poll_failures_total,
        dedup_entries = snapshot.dedup_entries,
        last_event_id = ?events.last_event_id(),
        "mcbridge shutdown complete"
    );
    Ok(())
}

fn monitor_settings(config: &BridgeConfig) -> MonitorSettings {
    MonitorSettings::new(config.endpoint_id.clone())
        .with_poll_interval(config.poll_interval)
        .with_lookback_days(config.lookback_days)
        .with_task_limit(config.task_limit)
}

fn logging_config(config: &BridgeConfig) -> LoggingConfig<'_> {
    LoggingConfig {
        level: &config.log_level,
        format: config
            .log_format
            .as_deref()
            .map_or_else(LogFormat::infer, LogFormat::from_name),
        build_sha: build_sha(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install shutdown signal handler");
        std::future::pending::<()>().await;
    }
}

fn spawn_event_logger(
    events: &EventBus,
    telemetry: Metrics,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut stream = events.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                item = stream.next() => match item {
                    Some(Ok(envelope)) => log_event(&telemetry, &envelope),
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!(skipped, "event logger lagged behind the bus");
                    }
                    None => break,
                },
                () = cancel.cancelled() => break,
            }
        }
    })
}

fn log_event(telemetry: &Metrics, envelope: &EventEnvelope) {
    telemetry.inc_event(envelope.event.kind());
    match &envelope.event {
        Event::UploadReady { routing_id } => {
            info!(event_id = envelope.id, routing_id = %routing_id, "upload ready for ingestion");
        }
        Event::HealthChanged { degraded } => {
            info!(event_id = envelope.id, degraded = ?degraded, "health changed");
        }
        other => debug!(event_id = envelope.id, kind = other.kind(), "event emitted"),
    }
}
