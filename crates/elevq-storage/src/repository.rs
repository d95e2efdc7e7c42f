// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`BookingRepository`] over a borrowed SQLite connection.

use chrono::{DateTime, NaiveDate, Utc};
use elevq_core::{
    Booking, BookingId, BookingRepository, Driver, DriverId, Elevator, ElevatorId, ElevqError,
    NewBooking, NewElevator, Notification, NotificationKind, RecipientHandle,
};
use rusqlite::{Connection, ErrorCode};

use crate::queries::{bookings, drivers, elevators, notifications};

/// Repository bound to one connection, normally an open transaction.
pub struct SqliteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn storage(e: rusqlite::Error) -> ElevqError {
    ElevqError::Storage {
        source: Box::new(e),
    }
}

/// Unique-index violations become [`ElevqError::Conflict`].
fn conflict_or_storage(e: rusqlite::Error, what: &str) -> ElevqError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            ElevqError::Conflict(what.to_string())
        }
        _ => storage(e),
    }
}

impl BookingRepository for SqliteRepository<'_> {
    fn elevator(&self, id: ElevatorId) -> Result<Option<Elevator>, ElevqError> {
        elevators::get(self.conn, id).map_err(storage)
    }

    fn elevator_by_name(&self, name: &str) -> Result<Option<Elevator>, ElevqError> {
        elevators::get_by_name(self.conn, name).map_err(storage)
    }

    fn elevators(&self) -> Result<Vec<Elevator>, ElevqError> {
        elevators::list(self.conn).map_err(storage)
    }

    fn insert_elevator(&mut self, elevator: &NewElevator) -> Result<Elevator, ElevqError> {
        elevators::insert(self.conn, elevator)
            .map_err(|e| conflict_or_storage(e, "elevator name already exists"))
    }

    fn driver(&self, id: DriverId) -> Result<Option<Driver>, ElevqError> {
        drivers::get(self.conn, id).map_err(storage)
    }

    fn driver_by_handle(&self, handle: RecipientHandle) -> Result<Option<Driver>, ElevqError> {
        drivers::get_by_handle(self.conn, handle).map_err(storage)
    }

    fn insert_driver(
        &mut self,
        handle: RecipientHandle,
        display_name: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Driver, ElevqError> {
        drivers::insert(self.conn, handle, display_name, created_at)
            .map_err(|e| conflict_or_storage(e, "driver already registered"))
    }

    fn booking(&self, id: BookingId) -> Result<Option<Booking>, ElevqError> {
        bookings::get(self.conn, id).map_err(storage)
    }

    fn bookings_for_day(
        &self,
        elevator: ElevatorId,
        day: NaiveDate,
    ) -> Result<Vec<Booking>, ElevqError> {
        bookings::for_day(self.conn, elevator, day).map_err(storage)
    }

    fn bookings_between(
        &self,
        elevator: Option<ElevatorId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, ElevqError> {
        bookings::between(self.conn, elevator, from, to).map_err(storage)
    }

    fn bookings_for_driver(
        &self,
        driver: DriverId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Booking>, ElevqError> {
        bookings::for_driver(self.conn, driver, since).map_err(storage)
    }

    fn open_days(&self) -> Result<Vec<(ElevatorId, NaiveDate)>, ElevqError> {
        bookings::open_days(self.conn).map_err(storage)
    }

    fn queued_booking_ids(&self) -> Result<Vec<BookingId>, ElevqError> {
        bookings::queued_ids(self.conn).map_err(storage)
    }

    fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, ElevqError> {
        bookings::insert(self.conn, booking)
            .map_err(|e| conflict_or_storage(e, "slot is already booked"))
    }

    fn update_booking(&mut self, booking: &Booking) -> Result<(), ElevqError> {
        match bookings::update(self.conn, booking) {
            Ok(0) => Err(ElevqError::not_found("booking", booking.id)),
            Ok(_) => Ok(()),
            Err(e) => Err(conflict_or_storage(e, "slot is already booked")),
        }
    }

    fn has_notification(
        &self,
        booking: BookingId,
        kind: NotificationKind,
    ) -> Result<bool, ElevqError> {
        notifications::exists(self.conn, booking, kind).map_err(storage)
    }

    fn record_notification(
        &mut self,
        booking: BookingId,
        kind: NotificationKind,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification, ElevqError> {
        notifications::insert(self.conn, booking, kind, sent_at)
            .map_err(|e| conflict_or_storage(e, "notification already recorded"))
    }
}
