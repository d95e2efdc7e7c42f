// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries, one module per table.
//!
//! Every function takes a plain `&rusqlite::Connection` so callers can
//! compose them inside one transaction (a `Transaction` derefs to it).

pub mod bookings;
pub mod drivers;
pub mod elevators;
pub mod notifications;

use rusqlite::types::Type;

/// Wrap a column decoding failure into a rusqlite conversion error.
pub(crate) fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}
