// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking rows.
//!
//! Timestamps are stored as UTC text in rusqlite's chrono encoding, which
//! sorts lexicographically in time order.

use chrono::{DateTime, NaiveDate, Utc};
use elevq_core::{Booking, BookingId, DriverId, ElevatorId, NewBooking};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::conversion_error;

const COLUMNS: &str = "id, driver_id, elevator_id, license_plate, day, slot_start, slot_end, \
     queue_position, last_notified_position, status, created_at, arrived_at, unloaded_at, \
     cancelled_at, updated_at";

/// Statuses that take part in queue ordering.
const QUEUED: &str = "status NOT IN ('CANCELLED', 'UNLOADED')";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let status: String = row.get(9)?;
    Ok(Booking {
        id: BookingId(row.get(0)?),
        driver_id: DriverId(row.get(1)?),
        elevator_id: ElevatorId(row.get(2)?),
        license_plate: row.get(3)?,
        day: row.get(4)?,
        slot_start: row.get(5)?,
        slot_end: row.get(6)?,
        queue_position: row.get(7)?,
        last_notified_position: row.get(8)?,
        status: status.parse().map_err(|e| conversion_error(9, e))?,
        created_at: row.get(10)?,
        arrived_at: row.get(11)?,
        unloaded_at: row.get(12)?,
        cancelled_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

pub fn get(conn: &Connection, id: BookingId) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM bookings WHERE id = ?1"),
        params![id.0],
        from_row,
    )
    .optional()
}

pub fn for_day(
    conn: &Connection,
    elevator: ElevatorId,
    day: NaiveDate,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM bookings WHERE elevator_id = ?1 AND day = ?2
         ORDER BY slot_start, id"
    ))?;
    let rows = stmt.query_map(params![elevator.0, day], from_row)?;
    rows.collect()
}

pub fn between(
    conn: &Connection,
    elevator: Option<ElevatorId>,
    from: NaiveDate,
    to: NaiveDate,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR elevator_id = ?1) AND day BETWEEN ?2 AND ?3
         ORDER BY slot_start, id"
    ))?;
    let rows = stmt.query_map(params![elevator.map(|e| e.0), from, to], from_row)?;
    rows.collect()
}

pub fn for_driver(
    conn: &Connection,
    driver: DriverId,
    since: DateTime<Utc>,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM bookings WHERE driver_id = ?1 AND slot_end >= ?2
         ORDER BY slot_start, id"
    ))?;
    let rows = stmt.query_map(params![driver.0, since], from_row)?;
    rows.collect()
}

/// Distinct (elevator, day) pairs holding at least one queued booking.
pub fn open_days(conn: &Connection) -> rusqlite::Result<Vec<(ElevatorId, NaiveDate)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT elevator_id, day FROM bookings WHERE {QUEUED} ORDER BY day, elevator_id"
    ))?;
    let rows = stmt.query_map([], |row| Ok((ElevatorId(row.get(0)?), row.get(1)?)))?;
    rows.collect()
}

pub fn queued_ids(conn: &Connection) -> rusqlite::Result<Vec<BookingId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM bookings WHERE {QUEUED} ORDER BY slot_start, id"
    ))?;
    let rows = stmt.query_map([], |row| Ok(BookingId(row.get(0)?)))?;
    rows.collect()
}

pub fn insert(conn: &Connection, booking: &NewBooking) -> rusqlite::Result<Booking> {
    conn.execute(
        "INSERT INTO bookings (driver_id, elevator_id, license_plate, day, slot_start, slot_end,
                               status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            booking.driver_id.0,
            booking.elevator_id.0,
            booking.license_plate,
            booking.day,
            booking.slot_start,
            booking.slot_end,
            booking.status.to_string(),
            booking.created_at,
        ],
    )?;
    Ok(Booking {
        id: BookingId(conn.last_insert_rowid()),
        driver_id: booking.driver_id,
        elevator_id: booking.elevator_id,
        license_plate: booking.license_plate.clone(),
        day: booking.day,
        slot_start: booking.slot_start,
        slot_end: booking.slot_end,
        queue_position: None,
        last_notified_position: None,
        status: booking.status,
        created_at: booking.created_at,
        arrived_at: None,
        unloaded_at: None,
        cancelled_at: None,
        updated_at: booking.created_at,
    })
}

/// Write back the mutable columns. Returns the number of rows touched.
pub fn update(conn: &Connection, booking: &Booking) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE bookings SET
             license_plate = ?2, day = ?3, slot_start = ?4, slot_end = ?5,
             queue_position = ?6, last_notified_position = ?7, status = ?8,
             arrived_at = ?9, unloaded_at = ?10, cancelled_at = ?11, updated_at = ?12
         WHERE id = ?1",
        params![
            booking.id.0,
            booking.license_plate,
            booking.day,
            booking.slot_start,
            booking.slot_end,
            booking.queue_position,
            booking.last_notified_position,
            booking.status.to_string(),
            booking.arrived_at,
            booking.unloaded_at,
            booking.cancelled_at,
            booking.updated_at,
        ],
    )
}
