// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message delivery.

use async_trait::async_trait;

use crate::error::ElevqError;
use crate::traits::adapter::PluginAdapter;
use crate::types::OutboundMessage;

/// Delivers text and buttons to a driver or dispatcher.
///
/// Delivery is best-effort. The engine calls `send` only after the state
/// change that produced the message has committed and logs failures instead
/// of propagating them.
#[async_trait]
pub trait Transport: PluginAdapter {
    /// Sends one message to `msg.recipient`.
    async fn send(&self, msg: OutboundMessage) -> Result<(), ElevqError>;
}
