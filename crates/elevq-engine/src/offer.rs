// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Early-slot offers.
//!
//! When a slot frees up ahead of schedule the head of the queue is asked to
//! come immediately. The runner-up is named in the decline token as the
//! fallback. A decline forwards the offer to that fallback once, with no
//! further fallback, so the cascade is exactly one level deep. Unanswered
//! offers never expire.

use chrono::{NaiveDate, SubsecRound};
use elevq_core::{
    Booking, BookingId, BookingRepository, Driver, Elevator, ElevqError, OutboundMessage,
    RecipientHandle,
};
use tracing::info;

use crate::lifecycle::{Outcome, load_booking, load_elevator};
use crate::queue::recalc_queue;
use crate::settings::EngineSettings;
use crate::{messages, metrics};

/// An offer that was queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub candidate: BookingId,
    pub fallback: Option<BookingId>,
}

/// Recalculate the queue of `elevator` on `day` and offer the freed slot to
/// its head. Returns `None` when nobody is queued.
pub fn open_offer(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    elevator: &Elevator,
    day: NaiveDate,
) -> Result<Option<(Offer, OutboundMessage)>, ElevqError> {
    let queue = recalc_queue(repo, elevator.id, day)?;
    let Some(candidate) = queue.first() else {
        return Ok(None);
    };
    let fallback = queue.get(1).map(|b| b.id);
    let msg = offer_message(repo, settings, candidate, fallback, elevator)?;

    metrics::record_offer();
    info!(
        elevator_id = %elevator.id,
        %day,
        candidate = %candidate.id,
        fallback = ?fallback.map(|f| f.0),
        "slot freed, offer sent to queue head"
    );
    Ok(Some((
        Offer {
            candidate: candidate.id,
            fallback,
        },
        msg,
    )))
}

fn offer_message(
    repo: &dyn BookingRepository,
    settings: &EngineSettings,
    candidate: &Booking,
    fallback: Option<BookingId>,
    elevator: &Elevator,
) -> Result<OutboundMessage, ElevqError> {
    let driver = load_driver(repo, candidate)?;
    Ok(messages::offer(
        driver.handle,
        candidate,
        fallback,
        &elevator.name,
        settings,
    ))
}

fn load_driver(repo: &dyn BookingRepository, booking: &Booking) -> Result<Driver, ElevqError> {
    repo.driver(booking.driver_id)?
        .ok_or_else(|| ElevqError::not_found("driver", booking.driver_id))
}

/// Reject responses from anyone but the booking's own driver.
fn verify_responder(
    repo: &dyn BookingRepository,
    booking: &Booking,
    responder: RecipientHandle,
) -> Result<Driver, ElevqError> {
    let driver = load_driver(repo, booking)?;
    if driver.handle != responder {
        return Err(ElevqError::Validation("this offer is not addressed to you".into()));
    }
    Ok(driver)
}

/// The candidate accepts: their slot moves to `now .. now + slot duration`
/// and the queue is recalculated. No further offers follow.
pub fn accept(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    now: chrono::DateTime<chrono::Utc>,
    responder: RecipientHandle,
    booking_id: BookingId,
) -> Result<Outcome<Booking>, ElevqError> {
    let mut booking = load_booking(repo, booking_id)?;
    let driver = verify_responder(repo, &booking, responder)?;
    if !booking.status.is_queued() {
        return Err(ElevqError::InvalidTransition {
            from: booking.status,
            action: "accept an offer for",
        });
    }

    let duration = settings.slot_duration().ok_or_else(|| {
        ElevqError::Config(format!(
            "slot duration of {} minutes is unusable",
            settings.slot_duration_minutes()
        ))
    })?;
    let start = now.trunc_subsecs(0);
    booking.slot_start = start;
    booking.slot_end = start + duration;
    booking.updated_at = now;
    repo.update_booking(&booking)?;

    let elevator = load_elevator(repo, booking.elevator_id)?;
    let queue = recalc_queue(repo, booking.elevator_id, booking.day)?;
    if let Some(updated) = queue.into_iter().find(|b| b.id == booking.id) {
        booking = updated;
    }
    info!(booking_id = %booking.id, slot_start = %booking.slot_start, "offer accepted");

    let msg = messages::offer_accepted(driver.handle, &booking, &elevator.name, settings);
    Ok(Outcome::new(booking).send(msg))
}

/// The candidate declines: forward the offer to `fallback`, if it is still
/// queued on the same elevator and day. The forwarded offer carries no
/// fallback of its own.
pub fn decline(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    responder: RecipientHandle,
    booking_id: BookingId,
    fallback: Option<BookingId>,
) -> Result<Outcome<Option<BookingId>>, ElevqError> {
    let booking = load_booking(repo, booking_id)?;
    verify_responder(repo, &booking, responder)?;

    let Some(fallback_id) = fallback else {
        info!(booking_id = %booking.id, "offer declined, no fallback");
        return Ok(Outcome::new(None));
    };
    let Some(next) = repo.booking(fallback_id)? else {
        return Ok(Outcome::new(None));
    };
    if !next.status.is_queued()
        || next.elevator_id != booking.elevator_id
        || next.day != booking.day
    {
        info!(booking_id = %booking.id, fallback = %fallback_id, "offer declined, fallback no longer eligible");
        return Ok(Outcome::new(None));
    }

    let elevator = load_elevator(repo, next.elevator_id)?;
    let msg = offer_message(repo, settings, &next, None, &elevator)?;
    metrics::record_offer();
    info!(booking_id = %booking.id, fallback = %next.id, "offer declined, forwarded to fallback");
    Ok(Outcome::new(Some(next.id)).send(msg))
}
