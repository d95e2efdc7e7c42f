// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking status transitions.
//!
//! Every function here runs inside one store transaction and returns the
//! messages to deliver once that transaction has committed.

use chrono::{DateTime, NaiveDate, Utc};
use elevq_core::{
    Booking, BookingId, BookingRepository, BookingStatus, Driver, Elevator, ElevatorId,
    ElevqError, NewBooking, NotificationKind, OutboundMessage, RecipientHandle,
};
use tracing::info;

use crate::offer::{self, Offer};
use crate::queue::recalc_queue;
use crate::settings::EngineSettings;
use crate::slots::{available_slots, candidate_slots};
use crate::{messages, metrics};

/// A committed result plus the messages it produced.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub outbox: Vec<OutboundMessage>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            outbox: Vec::new(),
        }
    }

    pub fn send(mut self, msg: OutboundMessage) -> Self {
        self.outbox.push(msg);
        self
    }
}

/// A driver's request for a slot.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub handle: RecipientHandle,
    pub display_name: Option<String>,
    pub elevator_id: ElevatorId,
    pub day: NaiveDate,
    pub slot_start: DateTime<Utc>,
    pub license_plate: String,
}

/// Result of unloading or cancelling a booking.
#[derive(Debug, Clone)]
pub struct Transition {
    pub booking: Booking,
    /// Set when the freed slot was offered to the queue head.
    pub offer: Option<Offer>,
}

pub(crate) fn load_booking(
    repo: &dyn BookingRepository,
    id: BookingId,
) -> Result<Booking, ElevqError> {
    repo.booking(id)?
        .ok_or_else(|| ElevqError::not_found("booking", id))
}

pub(crate) fn load_elevator(
    repo: &dyn BookingRepository,
    id: ElevatorId,
) -> Result<Elevator, ElevqError> {
    repo.elevator(id)?
        .ok_or_else(|| ElevqError::not_found("elevator", id))
}

fn driver_for(
    repo: &mut dyn BookingRepository,
    handle: RecipientHandle,
    display_name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Driver, ElevqError> {
    match repo.driver_by_handle(handle)? {
        Some(driver) => Ok(driver),
        None => {
            let driver = repo.insert_driver(handle, display_name, now)?;
            info!(driver_id = %driver.id, %handle, "driver registered");
            Ok(driver)
        }
    }
}

/// Confirm a new booking.
///
/// Availability is checked again here, inside the transaction, because the
/// slot list the driver picked from may be stale.
pub fn create(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    now: DateTime<Utc>,
    request: BookingRequest,
) -> Result<Outcome<Booking>, ElevqError> {
    let plate = request.license_plate.trim();
    if plate.is_empty() {
        return Err(ElevqError::Validation("license plate must not be empty".into()));
    }
    if request.day < settings.local_day(now) {
        return Err(ElevqError::Validation(format!(
            "{} is in the past",
            request.day.format("%Y-%m-%d")
        )));
    }

    let elevator = load_elevator(repo, request.elevator_id)?;
    if !candidate_slots(&elevator, request.day, settings)
        .iter()
        .any(|slot| slot.start == request.slot_start)
    {
        return Err(ElevqError::Validation(format!(
            "{} is not a slot of {}",
            settings.local_hm(request.slot_start),
            elevator.name
        )));
    }

    let existing = repo.bookings_for_day(elevator.id, request.day)?;
    let Some(slot) = available_slots(&elevator, request.day, &existing, settings, now)
        .into_iter()
        .find(|slot| slot.start == request.slot_start)
    else {
        metrics::record_conflict();
        return Err(ElevqError::Conflict(format!(
            "the {} slot at {} is no longer available",
            settings.local_hm(request.slot_start),
            elevator.name
        )));
    };

    let driver = driver_for(repo, request.handle, request.display_name.as_deref(), now)?;
    let inserted = repo.insert_booking(&NewBooking {
        driver_id: driver.id,
        elevator_id: elevator.id,
        license_plate: plate.to_string(),
        day: request.day,
        slot_start: slot.start,
        slot_end: slot.end,
        status: BookingStatus::Confirmed,
        created_at: now,
    })?;

    let queue = recalc_queue(repo, elevator.id, request.day)?;
    let mut booking = queue
        .into_iter()
        .find(|b| b.id == inserted.id)
        .ok_or_else(|| ElevqError::Internal(format!("booking {} missing from queue", inserted.id)))?;

    repo.record_notification(booking.id, NotificationKind::Confirmation, now)?;
    booking.last_notified_position = booking.queue_position;
    repo.update_booking(&booking)?;

    metrics::record_booking_created();
    metrics::record_notification("confirmation");
    info!(
        booking_id = %booking.id,
        elevator_id = %elevator.id,
        day = %booking.day,
        position = ?booking.queue_position,
        "booking confirmed"
    );

    let msg = messages::confirmation(driver.handle, &booking, &elevator.name, settings);
    Ok(Outcome::new(booking).send(msg))
}

fn require(booking: &Booking, next: BookingStatus, action: &'static str) -> Result<(), ElevqError> {
    if booking.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(ElevqError::InvalidTransition {
            from: booking.status,
            action,
        })
    }
}

/// Re-read a booking after a recalculation so the caller sees its position.
fn refreshed(queue: Vec<Booking>, booking: Booking) -> Booking {
    queue
        .into_iter()
        .find(|b| b.id == booking.id)
        .unwrap_or(booking)
}

/// The truck is at the elevator. May promote it over an absent head.
pub fn mark_arrived(
    repo: &mut dyn BookingRepository,
    now: DateTime<Utc>,
    id: BookingId,
) -> Result<Outcome<Booking>, ElevqError> {
    let mut booking = load_booking(repo, id)?;
    require(&booking, BookingStatus::Arrived, "mark arrived")?;

    booking.status = BookingStatus::Arrived;
    booking.arrived_at = Some(now);
    booking.updated_at = now;
    repo.update_booking(&booking)?;

    let queue = recalc_queue(repo, booking.elevator_id, booking.day)?;
    let booking = refreshed(queue, booking);
    metrics::record_transition("arrived");
    info!(booking_id = %booking.id, late = booking.is_late(), "truck arrived");
    Ok(Outcome::new(booking))
}

/// The truck has been unloaded and leaves the queue; the freed slot is
/// offered to the new head.
pub fn mark_unloaded(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    now: DateTime<Utc>,
    id: BookingId,
) -> Result<Outcome<Transition>, ElevqError> {
    let mut booking = load_booking(repo, id)?;
    require(&booking, BookingStatus::Unloaded, "mark unloaded")?;

    booking.status = BookingStatus::Unloaded;
    booking.queue_position = None;
    booking.unloaded_at = Some(now);
    booking.updated_at = now;
    repo.update_booking(&booking)?;
    metrics::record_transition("unloaded");
    info!(booking_id = %booking.id, "truck unloaded");

    let elevator = load_elevator(repo, booking.elevator_id)?;
    let mut outcome = Outcome::new(Transition {
        booking: booking.clone(),
        offer: None,
    });
    if let Some((offer, msg)) = offer::open_offer(repo, settings, &elevator, booking.day)? {
        outcome.value.offer = Some(offer);
        outcome = outcome.send(msg);
    }
    Ok(outcome)
}

/// Cancel a booking that is not yet finished. Cancelling the head of the
/// queue frees its slot like an unload does.
pub fn cancel(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    now: DateTime<Utc>,
    id: BookingId,
) -> Result<Outcome<Transition>, ElevqError> {
    let booking = load_booking(repo, id)?;
    require(&booking, BookingStatus::Cancelled, "cancel")?;

    // Positions may be stale; decide headship on a fresh queue.
    let queue = recalc_queue(repo, booking.elevator_id, booking.day)?;
    let was_head = queue.first().is_some_and(|b| b.id == booking.id);
    let mut booking = refreshed(queue, booking);

    booking.status = BookingStatus::Cancelled;
    booking.queue_position = None;
    booking.cancelled_at = Some(now);
    booking.updated_at = now;
    repo.update_booking(&booking)?;
    metrics::record_transition("cancelled");
    info!(booking_id = %booking.id, was_head, "booking cancelled");

    let mut outcome = Outcome::new(Transition {
        booking: booking.clone(),
        offer: None,
    });
    if was_head {
        let elevator = load_elevator(repo, booking.elevator_id)?;
        if let Some((offer, msg)) = offer::open_offer(repo, settings, &elevator, booking.day)? {
            outcome.value.offer = Some(offer);
            outcome = outcome.send(msg);
        }
    } else {
        recalc_queue(repo, booking.elevator_id, booking.day)?;
    }
    Ok(outcome)
}
