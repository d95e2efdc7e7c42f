// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Action tokens carried by chat buttons and echoed back by the transport.
//!
//! The string encodings are stable; both bots and the engine depend on them:
//!
//! | token | meaning |
//! |-------|---------|
//! | `arrive:<booking>` | dispatcher marks the truck as arrived |
//! | `unload:<booking>` | dispatcher marks the truck as unloaded |
//! | `cancel:<booking>` | dispatcher cancels the booking |
//! | `elevator:<name>` | dispatcher switches the elevator filter |
//! | `offer:accept:<booking>` | driver accepts an early-slot offer |
//! | `offer:decline:<booking>:<fallback or 0>` | driver declines; the fallback gets the next offer |

use std::fmt;
use std::str::FromStr;

use crate::error::ElevqError;
use crate::types::BookingId;

/// A decoded button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    Arrive(BookingId),
    Unload(BookingId),
    Cancel(BookingId),
    Elevator(String),
    OfferAccept(BookingId),
    OfferDecline {
        booking: BookingId,
        fallback: Option<BookingId>,
    },
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrive(id) => write!(f, "arrive:{id}"),
            Self::Unload(id) => write!(f, "unload:{id}"),
            Self::Cancel(id) => write!(f, "cancel:{id}"),
            Self::Elevator(name) => write!(f, "elevator:{name}"),
            Self::OfferAccept(id) => write!(f, "offer:accept:{id}"),
            Self::OfferDecline { booking, fallback } => {
                write!(f, "offer:decline:{booking}:{}", fallback.map_or(0, |id| id.0))
            }
        }
    }
}

fn parse_id(raw: &str, token: &str) -> Result<BookingId, ElevqError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(BookingId(id)),
        _ => Err(malformed(token)),
    }
}

fn malformed(token: &str) -> ElevqError {
    ElevqError::Validation(format!("malformed action token: {token:?}"))
}

impl FromStr for ActionToken {
    type Err = ElevqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s.split_once(':').ok_or_else(|| malformed(s))?;
        match kind {
            "arrive" => Ok(Self::Arrive(parse_id(rest, s)?)),
            "unload" => Ok(Self::Unload(parse_id(rest, s)?)),
            "cancel" => Ok(Self::Cancel(parse_id(rest, s)?)),
            // Elevator names may themselves contain colons.
            "elevator" if !rest.is_empty() => Ok(Self::Elevator(rest.to_string())),
            "offer" => {
                let mut parts = rest.split(':');
                match (parts.next(), parts.next(), parts.next(), parts.next()) {
                    (Some("accept"), Some(id), None, None) => {
                        Ok(Self::OfferAccept(parse_id(id, s)?))
                    }
                    (Some("decline"), Some(id), Some(fallback), None) => {
                        let fallback = match fallback {
                            "0" => None,
                            other => Some(parse_id(other, s)?),
                        };
                        Ok(Self::OfferDecline {
                            booking: parse_id(id, s)?,
                            fallback,
                        })
                    }
                    _ => Err(malformed(s)),
                }
            }
            _ => Err(malformed(s)),
        }
    }
}
