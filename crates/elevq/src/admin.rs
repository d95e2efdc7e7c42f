// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative commands: database setup, elevators and CSV export.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use elevq_config::model::ElevqConfig;
use elevq_core::{Elevator, ElevqError, NewElevator, PluginAdapter};
use elevq_engine::BookingEngine;
use elevq_engine::dispatch::LogTransport;
use elevq_storage::SqliteStore;
use tracing::info;

use crate::serve::build_engine;

/// `HH:MM` argument parser for clap.
pub fn parse_hm(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| format!("`{s}` is not a HH:MM time"))
}

async fn open_engine(config: &ElevqConfig) -> Result<BookingEngine<SqliteStore>, ElevqError> {
    let store = SqliteStore::open(&config.storage).await?;
    build_engine(config, store, Arc::new(LogTransport))
}

async fn close(engine: BookingEngine<SqliteStore>) -> Result<(), ElevqError> {
    engine.store().shutdown().await
}

/// Create the database file and apply migrations.
pub async fn init_db(config: &ElevqConfig) -> Result<(), ElevqError> {
    let store = SqliteStore::open(&config.storage).await?;
    info!(path = %config.storage.database_path, "database initialized");
    store.shutdown().await
}

pub async fn add_elevator(
    config: &ElevqConfig,
    elevator: NewElevator,
) -> Result<Elevator, ElevqError> {
    let engine = open_engine(config).await?;
    let added = engine.add_elevator(elevator).await;
    close(engine).await?;
    added
}

pub async fn list_elevators(config: &ElevqConfig) -> Result<Vec<Elevator>, ElevqError> {
    let engine = open_engine(config).await?;
    let elevators = engine.elevators().await;
    close(engine).await?;
    elevators
}

pub fn render_elevators(elevators: &[Elevator]) -> String {
    if elevators.is_empty() {
        return "no elevators configured\n".to_string();
    }
    elevators
        .iter()
        .map(|e| {
            format!(
                "{:>4}  {:<20} {}-{}  {} slots\n",
                e.id,
                e.name,
                e.work_day_start.format("%H:%M"),
                e.work_day_end.format("%H:%M"),
                e.bookable_slots_per_day
            )
        })
        .collect()
}

/// Write the CSV of `date` (default: today) to `output` or stdout.
pub async fn export(
    config: &ElevqConfig,
    date: Option<NaiveDate>,
    elevator: Option<&str>,
    output: Option<&Path>,
) -> Result<(), ElevqError> {
    let engine = open_engine(config).await?;
    let result = async {
        let day = date.unwrap_or_else(|| engine.today());
        let elevator_id = match elevator {
            Some(name) => Some(engine.elevator_by_name(name).await?.id),
            None => None,
        };
        let csv = engine.export_day(elevator_id, day).await?;
        let io_err = |e: std::io::Error| ElevqError::Internal(format!("failed to write export: {e}"));
        match output {
            Some(path) => {
                std::fs::write(path, &csv).map_err(io_err)?;
                info!(path = %path.display(), %day, "bookings exported");
            }
            None => std::io::stdout().write_all(&csv).map_err(io_err)?,
        }
        Ok::<(), ElevqError>(())
    }
    .await;
    close(engine).await?;
    result
}
