// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of bookings and errors for both bots.

use std::fmt::Write;

use elevq_core::{Action, ActionToken, Booking, BookingStatus, ElevqError};
use elevq_engine::{BookingCard, EngineSettings};

pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pending",
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Arrived => "arrived",
        BookingStatus::Unloaded => "unloaded",
        BookingStatus::Cancelled => "cancelled",
    }
}

fn slot(booking: &Booking, settings: &EngineSettings) -> String {
    format!(
        "{} {}-{}",
        booking.day.format("%Y-%m-%d"),
        settings.local_hm(booking.slot_start),
        settings.local_hm(booking.slot_end)
    )
}

/// Dispatcher card for one booking.
pub fn booking_card(card: &BookingCard, settings: &EngineSettings) -> String {
    let b = &card.booking;
    let mut text = format!(
        "#{} {}\n{}, {}\nStatus: {}",
        b.id,
        b.license_plate,
        card.elevator,
        slot(b, settings),
        status_label(b.status)
    );
    if b.is_late() {
        text.push_str(" (late)");
    }
    if let Some(position) = b.queue_position
        && b.status.is_queued()
    {
        let _ = write!(text, "\nQueue position: {}", position + 1);
    }
    if let Some(driver) = &card.driver {
        let name = driver.display_name.as_deref().unwrap_or("unnamed");
        let _ = write!(text, "\nDriver: {name} ({})", driver.handle);
    }
    text
}

/// Buttons a dispatcher may press for a booking in its current status.
pub fn card_actions(booking: &Booking) -> Vec<Action> {
    let id = booking.id;
    let action = |label: &str, token| Action {
        label: label.to_string(),
        token,
    };
    match booking.status {
        BookingStatus::Pending | BookingStatus::Confirmed => vec![
            action("Arrived", ActionToken::Arrive(id)),
            action("Cancel", ActionToken::Cancel(id)),
        ],
        BookingStatus::Arrived => vec![action("Unloaded", ActionToken::Unload(id))],
        BookingStatus::Unloaded | BookingStatus::Cancelled => Vec::new(),
    }
}

/// A driver's own bookings, one line each.
pub fn driver_bookings(cards: &[BookingCard], settings: &EngineSettings) -> String {
    if cards.is_empty() {
        return "You have no active bookings.".to_string();
    }
    let mut text = String::from("Your bookings:");
    for card in cards {
        let b = &card.booking;
        let _ = write!(
            text,
            "\n#{} {}, {}, plate {}: {}",
            b.id,
            card.elevator,
            slot(b, settings),
            b.license_plate,
            status_label(b.status)
        );
    }
    text
}

/// Multi-day overview, grouped by day.
pub fn schedule(cards: &[BookingCard], settings: &EngineSettings) -> String {
    if cards.is_empty() {
        return "No bookings.".to_string();
    }
    let mut text = String::new();
    let mut current_day = None;
    for card in cards {
        let b = &card.booking;
        if current_day != Some(b.day) {
            if current_day.is_some() {
                text.push('\n');
            }
            let _ = writeln!(text, "{}", b.day.format("%Y-%m-%d"));
            current_day = Some(b.day);
        }
        let _ = writeln!(
            text,
            "  {} {} #{} {} ({})",
            settings.local_hm(b.slot_start),
            card.elevator,
            b.id,
            b.license_plate,
            status_label(b.status)
        );
    }
    text.trim_end().to_string()
}

/// What a chat user is told when an engine call fails.
pub fn error_text(error: &ElevqError) -> String {
    match error {
        ElevqError::Validation(msg) => capitalize(msg),
        ElevqError::Conflict(_) => "That slot has just been taken. Please pick another one.".into(),
        ElevqError::NotFound { entity, .. } => format!("That {entity} no longer exists."),
        ElevqError::InvalidTransition { .. } => capitalize(&error.to_string()),
        _ => "Something went wrong. Please try again later.".into(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use elevq_core::{BookingId, Driver, DriverId, ElevatorId, RecipientHandle};

    fn settings() -> EngineSettings {
        EngineSettings::new(chrono_tz::Europe::Moscow, 60, &[60])
    }

    fn card(status: BookingStatus) -> BookingCard {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();
        BookingCard {
            booking: Booking {
                id: BookingId(12),
                driver_id: DriverId(3),
                elevator_id: ElevatorId(1),
                license_plate: "A123BC".into(),
                day: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                slot_start: start,
                slot_end: start + Duration::hours(1),
                queue_position: Some(0),
                last_notified_position: Some(0),
                status,
                created_at: start,
                arrived_at: None,
                unloaded_at: None,
                cancelled_at: None,
                updated_at: start,
            },
            elevator: "North".into(),
            driver: Some(Driver {
                id: DriverId(3),
                handle: RecipientHandle(555),
                display_name: Some("Ivan".into()),
                created_at: start,
            }),
        }
    }

    #[test]
    fn card_shows_slot_in_local_time() {
        let text = booking_card(&card(BookingStatus::Confirmed), &settings());
        assert_eq!(
            text,
            "#12 A123BC\nNorth, 2026-03-02 09:00-10:00\nStatus: confirmed\n\
             Queue position: 1\nDriver: Ivan (555)"
        );
    }

    #[test]
    fn actions_follow_status() {
        let tokens = |status| -> Vec<String> {
            card_actions(&card(status).booking)
                .into_iter()
                .map(|a| a.token.to_string())
                .collect()
        };
        assert_eq!(tokens(BookingStatus::Confirmed), ["arrive:12", "cancel:12"]);
        assert_eq!(tokens(BookingStatus::Pending), ["arrive:12", "cancel:12"]);
        assert_eq!(tokens(BookingStatus::Arrived), ["unload:12"]);
        assert!(tokens(BookingStatus::Unloaded).is_empty());
        assert!(tokens(BookingStatus::Cancelled).is_empty());
    }

    #[test]
    fn schedule_groups_by_day() {
        let first = card(BookingStatus::Confirmed);
        let mut second = card(BookingStatus::Arrived);
        second.booking.id = BookingId(13);
        second.booking.day = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        second.booking.slot_start += Duration::days(1);

        let text = schedule(&[first, second], &settings());
        assert_eq!(
            text,
            "2026-03-02\n  09:00 North #12 A123BC (confirmed)\n\n\
             2026-03-03\n  09:00 North #13 A123BC (arrived)"
        );
    }

    #[test]
    fn infrastructure_errors_stay_generic() {
        let text = error_text(&ElevqError::Internal("db exploded".into()));
        assert!(!text.contains("db exploded"));
        assert_eq!(
            error_text(&ElevqError::Validation("license plate must not be empty".into())),
            "License plate must not be empty"
        );
    }
}
