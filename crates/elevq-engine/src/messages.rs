// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driver-facing message texts.

use chrono::Duration;
use elevq_core::{ActionToken, Booking, BookingId, OutboundMessage, RecipientHandle};

use crate::settings::EngineSettings;

/// "N h" for whole hours, "N min" otherwise.
pub fn human_minutes(minutes: i64) -> String {
    if minutes > 0 && minutes % 60 == 0 {
        format!("{} h", minutes / 60)
    } else {
        format!("{minutes} min")
    }
}

/// Human description of a queue position (0 = next).
pub fn describe_position(position: Option<u32>) -> String {
    match position {
        Some(0) => "you are next in line".to_string(),
        Some(1) => "1 truck ahead of you".to_string(),
        Some(n) => format!("{n} trucks ahead of you"),
        None => "not in the queue".to_string(),
    }
}

fn slot_line(booking: &Booking, elevator: &str, settings: &EngineSettings) -> String {
    format!(
        "{elevator}, {} {}-{}",
        booking.day.format("%Y-%m-%d"),
        settings.local_hm(booking.slot_start),
        settings.local_hm(booking.slot_end),
    )
}

pub fn confirmation(
    to: RecipientHandle,
    booking: &Booking,
    elevator: &str,
    settings: &EngineSettings,
) -> OutboundMessage {
    OutboundMessage::text(
        to,
        format!(
            "Booking #{} confirmed: {}, plate {}.\nQueue: {}.",
            booking.id,
            slot_line(booking, elevator, settings),
            booking.license_plate,
            describe_position(booking.queue_position),
        ),
    )
}

pub fn reminder(
    to: RecipientHandle,
    booking: &Booking,
    elevator: &str,
    remaining: Duration,
    settings: &EngineSettings,
) -> OutboundMessage {
    // Round up so "starts in 0 min" never appears.
    let minutes = (remaining.num_seconds() + 59) / 60;
    OutboundMessage::text(
        to,
        format!(
            "Reminder: your slot starts in {} ({}), plate {}.\nQueue: {}.",
            human_minutes(minutes),
            slot_line(booking, elevator, settings),
            booking.license_plate,
            describe_position(booking.queue_position),
        ),
    )
}

pub fn queue_changed(
    to: RecipientHandle,
    booking: &Booking,
    elevator: &str,
    settings: &EngineSettings,
) -> OutboundMessage {
    OutboundMessage::text(
        to,
        format!(
            "Queue update for booking #{} ({}): {}.",
            booking.id,
            slot_line(booking, elevator, settings),
            describe_position(booking.queue_position),
        ),
    )
}

/// Offer to come immediately, with accept/decline buttons.
pub fn offer(
    to: RecipientHandle,
    candidate: &Booking,
    fallback: Option<BookingId>,
    elevator: &str,
    settings: &EngineSettings,
) -> OutboundMessage {
    OutboundMessage::text(
        to,
        format!(
            "{elevator} is free right now. Your booking #{} is scheduled for {}. \
             Can you come immediately?",
            candidate.id,
            settings.local_hm(candidate.slot_start),
        ),
    )
    .with_action("Coming now", ActionToken::OfferAccept(candidate.id))
    .with_action(
        "Can't come",
        ActionToken::OfferDecline {
            booking: candidate.id,
            fallback,
        },
    )
}

pub fn offer_accepted(
    to: RecipientHandle,
    booking: &Booking,
    elevator: &str,
    settings: &EngineSettings,
) -> OutboundMessage {
    OutboundMessage::text(
        to,
        format!(
            "{elevator} is expecting you now. New slot: {}-{}.",
            settings.local_hm(booking.slot_start),
            settings.local_hm(booking.slot_end),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_render_as_hours_when_whole() {
        assert_eq!(human_minutes(60), "1 h");
        assert_eq!(human_minutes(120), "2 h");
        assert_eq!(human_minutes(90), "90 min");
        assert_eq!(human_minutes(15), "15 min");
    }

    #[test]
    fn positions_read_naturally() {
        assert_eq!(describe_position(Some(0)), "you are next in line");
        assert_eq!(describe_position(Some(3)), "3 trucks ahead of you");
    }
}
