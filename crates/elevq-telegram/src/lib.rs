// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram adapters for the elevq booking queue.
//!
//! [`TelegramTransport`] implements [`Transport`] on top of the driver bot so
//! the engine can reach drivers. [`driver::DriverBot`] and
//! [`dispatcher::DispatcherBot`] run the two conversational front ends via
//! teloxide long polling.

pub mod dialog;
pub mod dispatcher;
pub mod driver;
pub mod format;
pub mod handler;
pub mod keyboards;

use async_trait::async_trait;
use elevq_core::error::ElevqError;
use elevq_core::traits::{PluginAdapter, Transport};
use elevq_core::types::{AdapterType, HealthStatus, OutboundMessage};
use teloxide::prelude::*;
use tracing::debug;

pub use dispatcher::DispatcherBot;
pub use driver::DriverBot;
pub use teloxide::Bot;

/// Creates a bot client, rejecting an empty token.
pub fn bot_from_token(token: &str, which: &str) -> Result<Bot, ElevqError> {
    if token.trim().is_empty() {
        return Err(ElevqError::Config(format!(
            "telegram.{which}_bot_token cannot be empty"
        )));
    }
    Ok(Bot::new(token))
}

/// Delivers engine messages through the driver bot.
///
/// Actions become a single row of inline buttons whose callback data is the
/// encoded [`ActionToken`](elevq_core::ActionToken).
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ElevqError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ElevqError> {
        debug!("Telegram transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ElevqError> {
        let chat_id = ChatId(msg.recipient.0);
        let request = self.bot.send_message(chat_id, msg.text);
        let result = if msg.actions.is_empty() {
            request.await
        } else {
            request
                .reply_markup(keyboards::inline_actions(&msg.actions))
                .await
        };
        result.map(|_| ()).map_err(|e| ElevqError::Transport {
            message: format!("failed to send message to {}: {e}", chat_id.0),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(bot_from_token("", "driver").is_err());
        assert!(bot_from_token("   ", "dispatcher").is_err());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let bot = bot_from_token("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11", "driver").unwrap();
        let transport = TelegramTransport::new(bot);
        assert_eq!(transport.name(), "telegram");
        assert_eq!(transport.version(), semver::Version::new(0, 1, 0));
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
    }
}
