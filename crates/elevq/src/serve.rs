// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `elevq serve` and `elevq notify`.
//!
//! `serve` opens the store, builds the engine, starts whichever bots have a
//! token, runs the notification loop every `queue.poll_interval_secs` and
//! waits for SIGINT/SIGTERM. `notify` runs a single notification pass.

use std::sync::Arc;
use std::time::Duration;

use elevq_config::model::{ElevqConfig, MetricsConfig};
use elevq_core::{BookingStore, ElevqError, PluginAdapter, Transport};
use elevq_engine::dispatch::LogTransport;
use elevq_engine::{BookingEngine, EngineSettings, SystemClock};
use elevq_storage::SqliteStore;
use elevq_telegram::{Bot, DispatcherBot, DriverBot, TelegramTransport};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::shutdown;

/// Build the engine over `store` with settings from `[queue]`.
pub fn build_engine<S: BookingStore>(
    config: &ElevqConfig,
    store: S,
    transport: Arc<dyn Transport>,
) -> Result<BookingEngine<S>, ElevqError> {
    let settings = EngineSettings::from_config(&config.queue)?;
    if settings.slot_duration().is_none() {
        warn!(
            slot_duration_minutes = settings.slot_duration_minutes(),
            "unusable slot duration, no slots will be offered"
        );
    }
    if settings.reminder_offsets().is_empty() {
        warn!("no positive reminder offsets configured, reminders are disabled");
    }
    info!(
        timezone = %settings.timezone(),
        slot_duration_minutes = settings.slot_duration_minutes(),
        reminder_offsets = ?settings.reminder_offsets(),
        transport = transport.name(),
        "booking engine ready"
    );
    Ok(BookingEngine::new(
        store,
        transport,
        Arc::new(SystemClock),
        settings,
    ))
}

/// The driver bot, when a token is configured.
fn driver_bot(config: &ElevqConfig) -> Result<Option<Bot>, ElevqError> {
    config
        .telegram
        .driver_bot_token
        .as_deref()
        .map(|token| elevq_telegram::bot_from_token(token, "driver"))
        .transpose()
}

/// Messages go out through the driver bot; without one they are only logged.
fn transport_for(bot: Option<&Bot>) -> Arc<dyn Transport> {
    match bot {
        Some(bot) => Arc::new(TelegramTransport::new(bot.clone())),
        None => {
            warn!("telegram.driver_bot_token is not set, driver messages will only be logged");
            Arc::new(LogTransport)
        }
    }
}

fn install_metrics(config: &MetricsConfig) -> Result<(), ElevqError> {
    let addr: std::net::SocketAddr = config.listen_address.parse().map_err(|e| {
        ElevqError::Config(format!(
            "metrics.listen_address `{}`: {e}",
            config.listen_address
        ))
    })?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ElevqError::Internal(format!("failed to install Prometheus exporter: {e}")))?;
    elevq_engine::metrics::register_metrics();
    info!(%addr, "prometheus exporter listening");
    Ok(())
}

/// Run all services until a shutdown signal arrives.
pub async fn run_serve(config: ElevqConfig) -> Result<(), ElevqError> {
    let cancel = shutdown::install_signal_handler();

    if config.metrics.enabled {
        install_metrics(&config.metrics)?;
    } else {
        debug!("prometheus metrics disabled by configuration");
    }

    let store = SqliteStore::open(&config.storage).await?;
    let driver = driver_bot(&config)?;
    let dispatcher = config
        .telegram
        .dispatcher_bot_token
        .as_deref()
        .map(|token| elevq_telegram::bot_from_token(token, "dispatcher"))
        .transpose()?;

    let engine = Arc::new(build_engine(
        &config,
        store.clone(),
        transport_for(driver.as_ref()),
    )?);

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    if let Some(bot) = driver {
        let driver_bot = Arc::new(DriverBot::new(Arc::clone(&engine)));
        tasks.push(tokio::spawn(driver_bot.run(bot, cancel.clone())));
    }

    match dispatcher {
        Some(bot) => {
            let dispatcher_bot = Arc::new(DispatcherBot::new(
                Arc::clone(&engine),
                config.telegram.allowed_dispatchers.clone(),
            ));
            tasks.push(tokio::spawn(dispatcher_bot.run(bot, cancel.clone())));
        }
        None => warn!("telegram.dispatcher_bot_token is not set, dispatcher bot disabled"),
    }

    let poll_interval = Duration::from_secs(config.queue.poll_interval_secs);
    tasks.push(tokio::spawn(notification_loop(
        Arc::clone(&engine),
        poll_interval,
        cancel.clone(),
    )));

    info!(tasks = tasks.len(), "elevq serving");
    cancel.cancelled().await;

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "background task panicked");
        }
    }

    store.shutdown().await?;
    info!("elevq stopped");
    Ok(())
}

/// Run one notification pass per `interval` until cancelled.
async fn notification_loop<S: BookingStore>(
    engine: Arc<BookingEngine<S>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "notification loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.notify_tick().await {
                    Ok(report) => debug!(
                        scanned = report.scanned,
                        reminders = report.reminders,
                        queue_updates = report.queue_updates,
                        delivered = report.delivered,
                        failures = report.failures,
                        "notification pass finished"
                    ),
                    Err(e) => error!(error = %e, "notification pass failed"),
                }
            }
            _ = cancel.cancelled() => {
                info!("notification loop shutting down");
                break;
            }
        }
    }
}

/// Run exactly one notification pass and exit.
pub async fn run_notify(config: ElevqConfig) -> Result<(), ElevqError> {
    let store = SqliteStore::open(&config.storage).await?;
    let bot = driver_bot(&config)?;
    let engine = build_engine(&config, store.clone(), transport_for(bot.as_ref()))?;

    let report = engine.notify_tick().await?;
    info!(
        days = report.days_recalculated,
        scanned = report.scanned,
        reminders = report.reminders,
        queue_updates = report.queue_updates,
        delivered = report.delivered,
        failures = report.failures,
        "notification pass finished"
    );
    store.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_runs_once_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ElevqConfig::default();
        config.storage.database_path = dir.path().join("elevq.db").to_string_lossy().to_string();
        run_notify(config).await.unwrap();
    }

    #[tokio::test]
    async fn bad_timezone_fails_engine_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ElevqConfig::default();
        config.storage.database_path = dir.path().join("elevq.db").to_string_lossy().to_string();
        config.queue.timezone = "Mars/Olympus".into();

        let store = SqliteStore::open(&config.storage).await.unwrap();
        let result = build_engine(&config, store, Arc::new(LogTransport));
        assert!(matches!(result, Err(ElevqError::Config(_))));
    }
}
