// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue ordering for one elevator and day.
//!
//! Positions are derived state. [`order_queue`] computes them from a
//! snapshot of the day's bookings and [`recalc_queue`] writes back whatever
//! changed. Only queued bookings hold a position; cancelled and unloaded
//! ones have none.

use chrono::NaiveDate;
use elevq_core::{Booking, BookingId, BookingRepository, ElevatorId, ElevqError};
use tracing::debug;

/// Order the queued bookings of a snapshot.
///
/// Bookings that are cancelled or unloaded are ignored. The rest are sorted
/// by `(slot_start, created_at, id)`. Then, if the head has not arrived but
/// the runner-up has, the two swap places. The swap never reaches past
/// position 1.
///
/// Element `i` of the result holds queue position `i`.
pub fn order_queue(bookings: &[Booking]) -> Vec<BookingId> {
    let mut queued: Vec<&Booking> = bookings.iter().filter(|b| b.status.is_queued()).collect();
    queued.sort_by_key(|b| (b.slot_start, b.created_at, b.id));

    if queued.len() >= 2 && queued[0].arrived_at.is_none() && queued[1].arrived_at.is_some() {
        queued.swap(0, 1);
    }

    queued.into_iter().map(|b| b.id).collect()
}

/// Recompute and persist queue positions for one elevator and day.
///
/// Returns the queued bookings ordered by their new position. Bookings that
/// left the queue lose their position, so no two bookings of the day ever
/// share one. Only rows whose position changed are written.
pub fn recalc_queue(
    repo: &mut dyn BookingRepository,
    elevator: ElevatorId,
    day: NaiveDate,
) -> Result<Vec<Booking>, ElevqError> {
    let mut bookings = repo.bookings_for_day(elevator, day)?;
    let order = order_queue(&bookings);

    for booking in bookings
        .iter_mut()
        .filter(|b| !b.status.is_queued() && b.queue_position.is_some())
    {
        debug!(booking_id = %booking.id, status = %booking.status, "clearing queue position");
        booking.queue_position = None;
        repo.update_booking(booking)?;
    }

    let mut queue = Vec::with_capacity(order.len());
    for (position, id) in order.iter().enumerate() {
        let Some(index) = bookings.iter().position(|b| b.id == *id) else {
            continue;
        };
        let mut booking = bookings.swap_remove(index);
        let position = Some(position as u32);
        if booking.queue_position != position {
            debug!(
                booking_id = %booking.id,
                elevator_id = %elevator,
                %day,
                from = ?booking.queue_position,
                to = ?position,
                "queue position changed"
            );
            booking.queue_position = position;
            repo.update_booking(&booking)?;
        }
        queue.push(booking);
    }
    Ok(queue)
}
