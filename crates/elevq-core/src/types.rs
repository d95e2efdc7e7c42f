// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the engine, the storage layer and the transports.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ElevqError;
use crate::token::ActionToken;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Primary key of an elevator row.
    ElevatorId
);
id_type!(
    /// Primary key of a driver row.
    DriverId
);
id_type!(
    /// Primary key of a booking row.
    BookingId
);
id_type!(
    /// Opaque numeric address a transport delivers to (a Telegram chat id).
    RecipientHandle
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Storage,
}

/// A loading elevator with its daily work window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elevator {
    pub id: ElevatorId,
    pub name: String,
    pub work_day_start: NaiveTime,
    pub work_day_end: NaiveTime,
    pub bookable_slots_per_day: u32,
}

/// Input for registering an elevator.
#[derive(Debug, Clone)]
pub struct NewElevator {
    pub name: String,
    pub work_day_start: NaiveTime,
    pub work_day_end: NaiveTime,
    pub bookable_slots_per_day: u32,
}

impl NewElevator {
    /// Checks the work window and name before the elevator is stored.
    pub fn validate(&self) -> Result<(), ElevqError> {
        if self.name.trim().is_empty() {
            return Err(ElevqError::Validation("elevator name is empty".into()));
        }
        if self.work_day_end <= self.work_day_start {
            return Err(ElevqError::Validation(format!(
                "work day end {} must be after start {}",
                self.work_day_end.format("%H:%M"),
                self.work_day_start.format("%H:%M"),
            )));
        }
        Ok(())
    }
}

/// A truck driver, created on their first booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub handle: RecipientHandle,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Booking lifecycle status.
///
/// `Pending` only appears while an interactive flow is still collecting input;
/// completed bookings start at `Confirmed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Arrived,
    Unloaded,
    Cancelled,
}

impl BookingStatus {
    /// Bookings that still wait for (or occupy) the elevator and take part in
    /// queue ordering.
    pub fn is_queued(self) -> bool {
        !matches!(self, Self::Cancelled | Self::Unloaded)
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        !self.is_queued()
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Arrived)
                | (Confirmed, Arrived)
                | (Arrived, Unloaded)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Arrived, Cancelled)
        )
    }
}

/// A reserved slot at one elevator on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub driver_id: DriverId,
    pub elevator_id: ElevatorId,
    pub license_plate: String,
    /// Calendar day in the configured local timezone.
    pub day: NaiveDate,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    /// Dense rank among queued bookings of the same elevator and day. `None`
    /// until the first recalculation.
    pub queue_position: Option<u32>,
    /// Position last reported to the driver.
    pub last_notified_position: Option<u32>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub unloaded_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Arrival strictly after the scheduled slot start.
    pub fn is_late(&self) -> bool {
        self.arrived_at.is_some_and(|at| at > self.slot_start)
    }
}

/// Input for inserting a booking; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub driver_id: DriverId,
    pub elevator_id: ElevatorId,
    pub license_plate: String,
    pub day: NaiveDate,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Notification ledger tag. The (booking, kind) pair is the dedup key for
/// confirmations and reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Confirmation,
    /// Reminder sent `minutes` before the slot starts.
    Reminder { minutes: i64 },
    QueuePositionChanged,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmation => f.write_str("CONFIRMATION"),
            Self::Reminder { minutes } => write!(f, "REMINDER_{minutes}M"),
            Self::QueuePositionChanged => f.write_str("QUEUE_POSITION_CHANGED"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ElevqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMATION" => Ok(Self::Confirmation),
            "QUEUE_POSITION_CHANGED" => Ok(Self::QueuePositionChanged),
            other => other
                .strip_prefix("REMINDER_")
                .and_then(|rest| rest.strip_suffix('M'))
                .and_then(|minutes| minutes.parse().ok())
                .map(|minutes| Self::Reminder { minutes })
                .ok_or_else(|| ElevqError::Validation(format!("unknown notification type: {s}"))),
        }
    }
}

/// One row of the append-only notification ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub booking_id: BookingId,
    pub kind: NotificationKind,
    pub sent_at: DateTime<Utc>,
}

/// A button attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub label: String,
    pub token: ActionToken,
}

/// A message the engine hands to a [`Transport`](crate::traits::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: RecipientHandle,
    pub text: String,
    /// Ordered buttons; empty for plain text.
    pub actions: Vec<Action>,
}

impl OutboundMessage {
    /// A plain text message without buttons.
    pub fn text(recipient: RecipientHandle, text: impl Into<String>) -> Self {
        Self {
            recipient,
            text: text.into(),
            actions: Vec::new(),
        }
    }

    /// Appends a button.
    pub fn with_action(mut self, label: impl Into<String>, token: ActionToken) -> Self {
        self.actions.push(Action {
            label: label.into(),
            token,
        });
        self
    }
}
