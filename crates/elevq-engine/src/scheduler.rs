// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification scheduler.
//!
//! Stateless: every pass recomputes what is due from stored bookings and the
//! notification ledger. Ledger rows are written in the same transaction
//! that decides to notify, before delivery, so a message is attempted at
//! most once.

use chrono::{DateTime, Duration, Utc};
use elevq_core::{BookingId, BookingRepository, ElevqError, NotificationKind, OutboundMessage};
use tracing::debug;

use crate::lifecycle::load_elevator;
use crate::queue::recalc_queue;
use crate::settings::EngineSettings;
use crate::{messages, metrics};

/// Summary of one scheduler pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub days_recalculated: usize,
    pub scanned: usize,
    pub reminders: usize,
    pub queue_updates: usize,
    pub delivered: usize,
    pub failures: usize,
}

/// What one booking produced during a pass.
#[derive(Debug, Default)]
pub struct BookingScan {
    pub reminder: Option<i64>,
    pub queue_update: bool,
    pub outbox: Vec<OutboundMessage>,
}

/// Recalculate every (elevator, day) queue that still has queued bookings.
pub fn refresh_queues(repo: &mut dyn BookingRepository) -> Result<usize, ElevqError> {
    let days = repo.open_days()?;
    for (elevator, day) in &days {
        recalc_queue(repo, *elevator, *day)?;
    }
    Ok(days.len())
}

/// Offsets (ascending) whose threshold has been crossed while the slot has
/// not started yet: `0 < remaining <= offset`. Offsets too large for a
/// duration never cross.
pub fn crossed_offsets(offsets: &[i64], remaining: Duration) -> impl Iterator<Item = i64> + '_ {
    offsets.iter().copied().filter(move |m| {
        remaining > Duration::zero()
            && Duration::try_minutes(*m).is_some_and(|offset| remaining <= offset)
    })
}

/// Decide and ledger the notifications due for one booking at `now`.
///
/// At most one reminder is sent per pass: the smallest crossed offset not yet
/// in the ledger. A changed queue position is reported independently.
pub fn scan_booking(
    repo: &mut dyn BookingRepository,
    settings: &EngineSettings,
    now: DateTime<Utc>,
    id: BookingId,
) -> Result<BookingScan, ElevqError> {
    let mut scan = BookingScan::default();
    let Some(mut booking) = repo.booking(id)? else {
        return Ok(scan);
    };
    if !booking.status.is_queued() {
        return Ok(scan);
    }

    let driver = repo
        .driver(booking.driver_id)?
        .ok_or_else(|| ElevqError::not_found("driver", booking.driver_id))?;
    let elevator = load_elevator(repo, booking.elevator_id)?;
    let remaining = booking.slot_start - now;

    let mut due = None;
    for minutes in crossed_offsets(settings.reminder_offsets(), remaining) {
        if !repo.has_notification(booking.id, NotificationKind::Reminder { minutes })? {
            due = Some(minutes);
            break;
        }
    }
    if let Some(minutes) = due {
        repo.record_notification(booking.id, NotificationKind::Reminder { minutes }, now)?;
        metrics::record_notification("reminder");
        debug!(booking_id = %booking.id, offset_minutes = minutes, "reminder due");
        scan.reminder = Some(minutes);
        scan.outbox.push(messages::reminder(
            driver.handle,
            &booking,
            &elevator.name,
            remaining,
            settings,
        ));
    }

    if booking.queue_position.is_some() && booking.queue_position != booking.last_notified_position
    {
        repo.record_notification(booking.id, NotificationKind::QueuePositionChanged, now)?;
        booking.last_notified_position = booking.queue_position;
        repo.update_booking(&booking)?;
        metrics::record_notification("queue_position_changed");
        debug!(booking_id = %booking.id, position = ?booking.queue_position, "queue position changed");
        scan.queue_update = true;
        scan.outbox.push(messages::queue_changed(
            driver.handle,
            &booking,
            &elevator.name,
            settings,
        ));
    }

    Ok(scan)
}
