// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! `MockTransport` implements `Transport` and captures every message it is
//! asked to send. It can be switched into a failing mode to exercise the
//! best-effort delivery path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use elevq_core::{
    AdapterType, ElevqError, HealthStatus, OutboundMessage, PluginAdapter, RecipientHandle,
    Transport,
};

/// A transport that records instead of delivering.
pub struct MockTransport {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failing: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// While failing, every `send()` returns a transport error and nothing
    /// is captured.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages addressed to one recipient, in send order.
    pub async fn sent_to(&self, recipient: RecipientHandle) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.recipient == recipient)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ElevqError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ElevqError> {
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ElevqError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ElevqError::Transport {
                message: format!("mock transport refused message to {}", msg.recipient),
                source: None,
            });
        }
        self.sent.lock().await.push(msg);
        Ok(())
    }
}
