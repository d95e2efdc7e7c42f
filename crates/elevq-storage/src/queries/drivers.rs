// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driver rows, keyed by their transport recipient handle.

use chrono::{DateTime, Utc};
use elevq_core::{Driver, DriverId, RecipientHandle};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, recipient_handle, display_name, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: DriverId(row.get(0)?),
        handle: RecipientHandle(row.get(1)?),
        display_name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn get(conn: &Connection, id: DriverId) -> rusqlite::Result<Option<Driver>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM drivers WHERE id = ?1"),
        params![id.0],
        from_row,
    )
    .optional()
}

pub fn get_by_handle(
    conn: &Connection,
    handle: RecipientHandle,
) -> rusqlite::Result<Option<Driver>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM drivers WHERE recipient_handle = ?1"),
        params![handle.0],
        from_row,
    )
    .optional()
}

pub fn insert(
    conn: &Connection,
    handle: RecipientHandle,
    display_name: Option<&str>,
    created_at: DateTime<Utc>,
) -> rusqlite::Result<Driver> {
    conn.execute(
        "INSERT INTO drivers (recipient_handle, display_name, created_at) VALUES (?1, ?2, ?3)",
        params![handle.0, display_name, created_at],
    )?;
    Ok(Driver {
        id: DriverId(conn.last_insert_rowid()),
        handle,
        display_name: display_name.map(str::to_string),
        created_at,
    })
}
