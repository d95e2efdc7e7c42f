// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The driver's booking dialog.
//!
//! One [`Dialog`] per chat, advanced by each text reply. Parsing lives here
//! as pure functions; the bot in [`crate::driver`] does the I/O.

use chrono::NaiveDate;
use elevq_core::{Elevator, ElevqError};
use elevq_engine::{EngineSettings, Slot};

use crate::keyboards;

/// Where a chat is in the booking flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    ChooseElevator,
    ChooseDate {
        elevator: Elevator,
    },
    ChooseSlot {
        elevator: Elevator,
        day: NaiveDate,
        slots: Vec<Slot>,
    },
    EnterPlate {
        elevator: Elevator,
        day: NaiveDate,
        slot: Slot,
    },
    Confirm {
        elevator: Elevator,
        day: NaiveDate,
        slot: Slot,
        plate: String,
    },
}

/// Answer to the final question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

/// The two quick picks offered for the date step.
pub fn date_choices(today: NaiveDate) -> Vec<String> {
    [Some(today), today.succ_opt()]
        .into_iter()
        .flatten()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

/// A `YYYY-MM-DD` date (or "Today"/"Tomorrow") not before `today`.
pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate, ElevqError> {
    let input = input.trim();
    let day = if input.eq_ignore_ascii_case(keyboards::TODAY) {
        today
    } else if input.eq_ignore_ascii_case(keyboards::TOMORROW) {
        today
            .succ_opt()
            .ok_or_else(|| ElevqError::Validation("date out of range".into()))?
    } else {
        NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
            ElevqError::Validation(format!("\"{input}\" is not a date, use YYYY-MM-DD"))
        })?
    };
    if day < today {
        return Err(ElevqError::Validation(format!(
            "{} is in the past",
            day.format("%Y-%m-%d")
        )));
    }
    Ok(day)
}

/// Slot start labels in local `HH:MM`.
pub fn slot_labels(slots: &[Slot], settings: &EngineSettings) -> Vec<String> {
    slots.iter().map(|s| settings.local_hm(s.start)).collect()
}

/// The offered slot whose local start matches `input`.
pub fn pick_slot(input: &str, slots: &[Slot], settings: &EngineSettings) -> Option<Slot> {
    let input = input.trim();
    slots
        .iter()
        .copied()
        .find(|s| settings.local_hm(s.start) == input)
}

pub fn parse_plate(input: &str) -> Result<String, ElevqError> {
    let plate = input.trim();
    if plate.is_empty() {
        return Err(ElevqError::Validation("license plate must not be empty".into()));
    }
    Ok(plate.to_uppercase())
}

pub fn parse_confirmation(input: &str) -> Option<Confirmation> {
    let input = input.trim();
    if input.eq_ignore_ascii_case(keyboards::CONFIRM) {
        Some(Confirmation::Yes)
    } else if input.eq_ignore_ascii_case(keyboards::CANCEL) {
        Some(Confirmation::No)
    } else {
        None
    }
}

/// Summary shown before the final confirmation.
pub fn summary(
    elevator: &Elevator,
    day: NaiveDate,
    slot: &Slot,
    plate: &str,
    settings: &EngineSettings,
) -> String {
    format!(
        "Please check your booking:\nElevator: {}\nDate: {}\nTime: {}-{}\nPlate: {plate}",
        elevator.name,
        day.format("%Y-%m-%d"),
        settings.local_hm(slot.start),
        settings.local_hm(slot.end),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn dates_parse_and_past_is_rejected() {
        let today = day(2);
        assert_eq!(parse_day("2026-03-04", today).unwrap(), day(4));
        assert_eq!(parse_day(" today ", today).unwrap(), today);
        assert_eq!(parse_day("Tomorrow", today).unwrap(), day(3));
        assert!(matches!(
            parse_day("2026-03-01", today),
            Err(ElevqError::Validation(_))
        ));
        assert!(matches!(parse_day("next week", today), Err(ElevqError::Validation(_))));
    }

    #[test]
    fn date_choices_are_today_and_tomorrow() {
        assert_eq!(date_choices(day(2)), ["2026-03-02", "2026-03-03"]);
    }

    #[test]
    fn slots_are_picked_by_local_label() {
        let settings = EngineSettings::new(chrono_tz::Europe::Moscow, 60, &[]);
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
        let slots: Vec<Slot> = (0..3)
            .map(|i| Slot {
                start: start + Duration::hours(i),
                end: start + Duration::hours(i + 1),
            })
            .collect();

        assert_eq!(slot_labels(&slots, &settings), ["08:00", "09:00", "10:00"]);
        assert_eq!(pick_slot("09:00", &slots, &settings), Some(slots[1]));
        assert_eq!(pick_slot("09:30", &slots, &settings), None);
    }

    #[test]
    fn plate_is_trimmed_and_required() {
        assert_eq!(parse_plate("  a123bc 77 ").unwrap(), "A123BC 77");
        assert!(parse_plate("   ").is_err());
    }

    #[test]
    fn confirmation_answers() {
        assert_eq!(parse_confirmation("confirm"), Some(Confirmation::Yes));
        assert_eq!(parse_confirmation("Cancel"), Some(Confirmation::No));
        assert_eq!(parse_confirmation("maybe"), None);
    }
}
