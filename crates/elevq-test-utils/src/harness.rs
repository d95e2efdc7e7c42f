// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles a [`BookingEngine`] over a temp SQLite database,
//! a [`MockTransport`] and a [`FixedClock`], plus helpers for the common
//! steps of a booking scenario.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use elevq_config::model::StorageConfig;
use elevq_core::{Booking, BookingId, Elevator, ElevqError, NewElevator, RecipientHandle};
use elevq_engine::{BookingEngine, BookingRequest, EngineSettings};
use elevq_storage::SqliteStore;

use crate::clock::FixedClock;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    now: DateTime<Utc>,
    timezone: Tz,
    slot_minutes: i64,
    reminder_offsets: Vec<i64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            // A Monday, before any work day starts.
            now: Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).single().unwrap_or_default(),
            timezone: Tz::UTC,
            slot_minutes: 60,
            reminder_offsets: vec![60, 30],
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_slot_minutes(mut self, minutes: i64) -> Self {
        self.slot_minutes = minutes;
        self
    }

    pub fn with_reminder_offsets(mut self, offsets: Vec<i64>) -> Self {
        self.reminder_offsets = offsets;
        self
    }

    /// Build the harness, creating the temp database and running migrations.
    pub async fn build(self) -> Result<TestHarness, ElevqError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ElevqError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let store = SqliteStore::open(&StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        })
        .await?;

        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(FixedClock::new(self.now));
        let settings =
            EngineSettings::new(self.timezone, self.slot_minutes, &self.reminder_offsets);
        let engine = BookingEngine::new(store, transport.clone(), clock.clone(), settings);

        Ok(TestHarness {
            engine,
            transport,
            clock,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine wired to mocks.
pub struct TestHarness {
    pub engine: BookingEngine<SqliteStore>,
    pub transport: Arc<MockTransport>,
    pub clock: Arc<FixedClock>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings: UTC, 60 minute slots, reminders at
    /// 60 and 30 minutes.
    pub async fn new() -> Result<Self, ElevqError> {
        Self::builder().build().await
    }

    /// The day the clock currently falls on.
    pub fn today(&self) -> NaiveDate {
        self.engine.today()
    }

    /// UTC instant of local `hh:mm` on `day`.
    ///
    /// # Panics
    ///
    /// On a malformed time or one inside a DST gap.
    pub fn at(&self, day: NaiveDate, hh_mm: &str) -> DateTime<Utc> {
        let time = NaiveTime::parse_from_str(hh_mm, "%H:%M").expect("time must be HH:MM");
        self.engine
            .settings()
            .to_utc(day, time)
            .expect("time must exist in the harness timezone")
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Register an elevator with an `hh:mm` work window.
    pub async fn add_elevator(
        &self,
        name: &str,
        start: &str,
        end: &str,
        slots: u32,
    ) -> Result<Elevator, ElevqError> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s, "%H:%M")
                .map_err(|e| ElevqError::Validation(format!("bad time {s}: {e}")))
        };
        self.engine
            .add_elevator(NewElevator {
                name: name.to_string(),
                work_day_start: parse(start)?,
                work_day_end: parse(end)?,
                bookable_slots_per_day: slots,
            })
            .await
    }

    /// Point `booking` at a driver row that does not exist, bypassing the
    /// foreign key, so every later lookup of its driver fails.
    pub async fn orphan_booking(&self, booking: BookingId) -> Result<(), ElevqError> {
        let sql = format!(
            "PRAGMA foreign_keys = OFF;
             UPDATE bookings SET driver_id = -1 WHERE id = {};
             PRAGMA foreign_keys = ON;",
            booking.0
        );
        self.engine
            .store()
            .database()
            .connection()
            .call(move |conn| conn.execute_batch(&sql))
            .await
            .map_err(|e| ElevqError::Storage {
                source: e.to_string().into(),
            })
    }

    /// Book `elevator` at local `hh_mm` on `day` for driver `handle`.
    pub async fn book(
        &self,
        handle: i64,
        elevator: &Elevator,
        day: NaiveDate,
        hh_mm: &str,
        plate: &str,
    ) -> Result<Booking, ElevqError> {
        self.engine
            .create_booking(BookingRequest {
                handle: RecipientHandle(handle),
                display_name: None,
                elevator_id: elevator.id,
                day,
                slot_start: self.at(day, hh_mm),
                license_plate: plate.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_books_and_captures_confirmation() {
        let h = TestHarness::new().await.unwrap();
        let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
        let booking = h
            .book(100, &elevator, h.today(), "09:00", "A123BC")
            .await
            .unwrap();

        assert_eq!(booking.queue_position, Some(0));
        let sent = h.transport.sent_to(RecipientHandle(100)).await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("confirmed"));
    }
}
