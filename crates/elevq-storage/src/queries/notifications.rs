// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The append-only notification ledger.

use chrono::{DateTime, Utc};
use elevq_core::{BookingId, Notification, NotificationKind};
use rusqlite::{Connection, params};

use super::conversion_error;

pub fn exists(conn: &Connection, booking: BookingId, kind: NotificationKind) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notifications WHERE booking_id = ?1 AND notification_type = ?2)",
        params![booking.0, kind.to_string()],
        |row| row.get(0),
    )
}

pub fn insert(
    conn: &Connection,
    booking: BookingId,
    kind: NotificationKind,
    sent_at: DateTime<Utc>,
) -> rusqlite::Result<Notification> {
    conn.execute(
        "INSERT INTO notifications (booking_id, notification_type, sent_at) VALUES (?1, ?2, ?3)",
        params![booking.0, kind.to_string(), sent_at],
    )?;
    Ok(Notification {
        id: conn.last_insert_rowid(),
        booking_id: booking,
        kind,
        sent_at,
    })
}

/// Full ledger of one booking, oldest first.
pub fn for_booking(conn: &Connection, booking: BookingId) -> rusqlite::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, notification_type, sent_at FROM notifications
         WHERE booking_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![booking.0], |row| {
        let kind: String = row.get(2)?;
        Ok(Notification {
            id: row.get(0)?,
            booking_id: BookingId(row.get(1)?),
            kind: kind.parse().map_err(|e| conversion_error(2, e))?,
            sent_at: row.get(3)?,
        })
    })?;
    rows.collect()
}
