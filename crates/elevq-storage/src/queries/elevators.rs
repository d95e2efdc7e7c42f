// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elevator rows.

use elevq_core::{Elevator, ElevatorId, NewElevator};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, name, work_day_start, work_day_end, bookable_slots_per_day";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Elevator> {
    Ok(Elevator {
        id: ElevatorId(row.get(0)?),
        name: row.get(1)?,
        work_day_start: row.get(2)?,
        work_day_end: row.get(3)?,
        bookable_slots_per_day: row.get(4)?,
    })
}

pub fn get(conn: &Connection, id: ElevatorId) -> rusqlite::Result<Option<Elevator>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM elevators WHERE id = ?1"),
        params![id.0],
        from_row,
    )
    .optional()
}

pub fn get_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Elevator>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM elevators WHERE name = ?1"),
        params![name],
        from_row,
    )
    .optional()
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Elevator>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM elevators ORDER BY name"))?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn insert(conn: &Connection, elevator: &NewElevator) -> rusqlite::Result<Elevator> {
    conn.execute(
        "INSERT INTO elevators (name, work_day_start, work_day_end, bookable_slots_per_day)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            elevator.name,
            elevator.work_day_start,
            elevator.work_day_end,
            elevator.bookable_slots_per_day,
        ],
    )?;
    Ok(Elevator {
        id: ElevatorId(conn.last_insert_rowid()),
        name: elevator.name.clone(),
        work_day_start: elevator.work_day_start,
        work_day_end: elevator.work_day_end,
        bookable_slots_per_day: elevator.bookable_slots_per_day,
    })
}
