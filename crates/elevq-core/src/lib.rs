// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the elevq booking queue.
//!
//! This crate provides the domain types (elevators, drivers, bookings and the
//! notification ledger), the workspace error type, the action-token encoding
//! shared by both chat bots, and the adapter traits implemented by the
//! storage and transport crates.

pub mod error;
pub mod token;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ElevqError;
pub use token::ActionToken;
pub use types::{
    Action, AdapterType, Booking, BookingId, BookingStatus, Driver, DriverId, Elevator,
    ElevatorId, HealthStatus, NewBooking, NewElevator, Notification, NotificationKind,
    OutboundMessage, RecipientHandle,
};

// Re-export all adapter traits at crate root.
pub use traits::{BookingRepository, BookingStore, PluginAdapter, Transport};
