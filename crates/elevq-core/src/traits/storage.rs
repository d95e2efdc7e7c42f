// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for the booking store.
//!
//! The engine never talks to a database directly. It hands a closure to
//! [`BookingStore::transaction`], which runs it atomically against a
//! [`BookingRepository`]. Every read-modify-write sequence of the booking
//! lifecycle happens inside one such closure.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ElevqError;
use crate::types::{
    Booking, BookingId, Driver, DriverId, Elevator, ElevatorId, NewBooking, NewElevator,
    Notification, NotificationKind, RecipientHandle,
};

/// Synchronous unit-of-work view of the store, valid for one transaction.
///
/// Inserts return the stored row with its generated id, so later statements
/// of the same transaction can reference it before commit.
pub trait BookingRepository {
    fn elevator(&self, id: ElevatorId) -> Result<Option<Elevator>, ElevqError>;

    fn elevator_by_name(&self, name: &str) -> Result<Option<Elevator>, ElevqError>;

    /// All elevators ordered by name.
    fn elevators(&self) -> Result<Vec<Elevator>, ElevqError>;

    /// Fails with [`ElevqError::Conflict`] when the name is already taken.
    fn insert_elevator(&mut self, elevator: &NewElevator) -> Result<Elevator, ElevqError>;

    fn driver(&self, id: DriverId) -> Result<Option<Driver>, ElevqError>;

    fn driver_by_handle(&self, handle: RecipientHandle) -> Result<Option<Driver>, ElevqError>;

    fn insert_driver(
        &mut self,
        handle: RecipientHandle,
        display_name: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Driver, ElevqError>;

    fn booking(&self, id: BookingId) -> Result<Option<Booking>, ElevqError>;

    /// Every booking of one elevator and day regardless of status, ordered by
    /// slot start then id.
    fn bookings_for_day(
        &self,
        elevator: ElevatorId,
        day: NaiveDate,
    ) -> Result<Vec<Booking>, ElevqError>;

    /// Bookings whose day lies in `from..=to`, optionally for one elevator,
    /// ordered by slot start then id.
    fn bookings_between(
        &self,
        elevator: Option<ElevatorId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Booking>, ElevqError>;

    /// A driver's bookings whose slot ends at or after `since`, ordered by slot start.
    fn bookings_for_driver(
        &self,
        driver: DriverId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Booking>, ElevqError>;

    /// Distinct (elevator, day) pairs that currently have at least one
    /// non-cancelled booking.
    fn open_days(&self) -> Result<Vec<(ElevatorId, NaiveDate)>, ElevqError>;

    /// Ids of all queued bookings (status neither cancelled nor unloaded).
    fn queued_booking_ids(&self) -> Result<Vec<BookingId>, ElevqError>;

    /// Fails with [`ElevqError::Conflict`] when a non-cancelled booking
    /// already holds the same elevator and slot start.
    fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, ElevqError>;

    /// Writes every mutable column of `booking` back by id.
    fn update_booking(&mut self, booking: &Booking) -> Result<(), ElevqError>;

    fn has_notification(
        &self,
        booking: BookingId,
        kind: NotificationKind,
    ) -> Result<bool, ElevqError>;

    fn record_notification(
        &mut self,
        booking: BookingId,
        kind: NotificationKind,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification, ElevqError>;
}

/// A transactional booking store.
#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    /// Runs `work` atomically. The transaction commits when `work` returns
    /// `Ok` and rolls back otherwise.
    async fn transaction<T, F>(&self, work: F) -> Result<T, ElevqError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn BookingRepository) -> Result<T, ElevqError> + Send + 'static;
}
