// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily slot grid and availability.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use elevq_core::{Booking, BookingStatus, Elevator};

use crate::settings::EngineSettings;

/// A concrete slot on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Enumerate the candidate `(start, end)` pairs of a work window.
///
/// Slots advance from `start` in steps of `duration_minutes` while the slot
/// end stays within the window (and the same day) and fewer than `max_slots`
/// have been produced. Degenerate inputs give an empty grid.
pub fn build_daily_slots(
    start: NaiveTime,
    end: NaiveTime,
    duration_minutes: i64,
    max_slots: u32,
) -> Vec<(NaiveTime, NaiveTime)> {
    let mut slots = Vec::new();
    let Some(step) = Duration::try_minutes(duration_minutes).filter(|d| *d > Duration::zero())
    else {
        return slots;
    };
    if start >= end {
        return slots;
    }

    let mut current = start;
    while slots.len() < max_slots as usize {
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || next > end {
            break;
        }
        slots.push((current, next));
        current = next;
    }
    slots
}

/// Slots of `elevator` on `day` that can still be booked at `now`.
///
/// `bookings` are the day's existing bookings (any status). A slot is taken
/// when a non-cancelled booking starts at the same instant. On the current
/// local day, slots that start at or before `now` are hidden as well.
pub fn available_slots(
    elevator: &Elevator,
    day: NaiveDate,
    bookings: &[Booking],
    settings: &EngineSettings,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let is_today = settings.local_day(now) == day;

    candidate_slots(elevator, day, settings)
        .into_iter()
        .filter(|slot| {
            !bookings
                .iter()
                .any(|b| b.status != BookingStatus::Cancelled && b.slot_start == slot.start)
        })
        .filter(|slot| !(is_today && slot.start <= now))
        .collect()
}

/// The full grid of `elevator` on `day` as UTC instants, skipping local
/// times that do not exist.
pub fn candidate_slots(elevator: &Elevator, day: NaiveDate, settings: &EngineSettings) -> Vec<Slot> {
    let Some(duration) = settings.slot_duration() else {
        return Vec::new();
    };
    build_daily_slots(
        elevator.work_day_start,
        elevator.work_day_end,
        settings.slot_duration_minutes(),
        elevator.bookable_slots_per_day,
    )
    .into_iter()
    .filter_map(|(start, _)| settings.to_utc(day, start))
    .map(|start| Slot {
        start,
        end: start + duration,
    })
    .collect()
}
