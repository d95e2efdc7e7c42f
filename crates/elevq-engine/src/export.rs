// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV export of a day's bookings.

use elevq_core::{Booking, ElevqError};

use crate::settings::EngineSettings;

const HEADER: [&str; 5] = ["license_plate", "slot_start", "slot_end", "is_late", "unloaded"];

fn csv_err(e: impl std::error::Error + Send + Sync + 'static) -> ElevqError {
    ElevqError::Internal(format!("csv export failed: {e}"))
}

/// Render `bookings` as CSV. Timestamps are RFC 3339 in the configured
/// timezone; `is_late` means the truck arrived after its slot started.
pub fn bookings_to_csv(bookings: &[Booking], settings: &EngineSettings) -> Result<Vec<u8>, ElevqError> {
    let tz = settings.timezone();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).map_err(csv_err)?;
    for booking in bookings {
        writer
            .write_record([
                booking.license_plate.clone(),
                booking.slot_start.with_timezone(&tz).to_rfc3339(),
                booking.slot_end.with_timezone(&tz).to_rfc3339(),
                booking.is_late().to_string(),
                booking.unloaded_at.is_some().to_string(),
            ])
            .map_err(csv_err)?;
    }
    writer.into_inner().map_err(|e| csv_err(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use elevq_core::{BookingId, BookingStatus, DriverId, ElevatorId};

    #[test]
    fn renders_header_and_flags() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();
        let booking = Booking {
            id: BookingId(1),
            driver_id: DriverId(1),
            elevator_id: ElevatorId(1),
            license_plate: "A123BC, 77".into(),
            day: start.date_naive(),
            slot_start: start,
            slot_end: start + Duration::hours(1),
            queue_position: Some(0),
            last_notified_position: Some(0),
            status: BookingStatus::Unloaded,
            created_at: start,
            arrived_at: Some(start + Duration::minutes(5)),
            unloaded_at: Some(start + Duration::minutes(40)),
            cancelled_at: None,
            updated_at: start,
        };
        let settings = EngineSettings::new(chrono_tz::Europe::Moscow, 60, &[]);
        let csv = String::from_utf8(bookings_to_csv(&[booking], &settings).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("license_plate,slot_start,slot_end,is_late,unloaded"));
        assert_eq!(
            lines.next(),
            Some("\"A123BC, 77\",2026-03-02T09:00:00+03:00,2026-03-02T10:00:00+03:00,true,true")
        );
        assert_eq!(lines.next(), None);
    }
}
