// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite booking store.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed queries for elevators,
//! drivers, bookings and the notification ledger. [`SqliteStore`] runs every
//! engine unit of work as one `IMMEDIATE` transaction on the writer thread.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use adapter::SqliteStore;
pub use database::Database;
pub use repository::SqliteRepository;
