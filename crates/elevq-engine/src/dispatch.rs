// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort delivery of committed outbound messages.

use async_trait::async_trait;
use elevq_core::{
    AdapterType, ElevqError, HealthStatus, OutboundMessage, PluginAdapter, Transport,
};
use tracing::{info, warn};

use crate::metrics;

/// Send each message in order. Failures are logged and counted, never
/// retried or returned. Returns how many were accepted by the transport.
pub async fn deliver(transport: &dyn Transport, outbox: Vec<OutboundMessage>) -> usize {
    let mut delivered = 0;
    for msg in outbox {
        let recipient = msg.recipient;
        match transport.send(msg).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                metrics::record_transport_failure();
                warn!(
                    transport = transport.name(),
                    %recipient,
                    error = %e,
                    "message delivery failed"
                );
            }
        }
    }
    delivered
}

/// Transport that only logs. Used when no driver bot is configured.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl PluginAdapter for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ElevqError> {
        Ok(HealthStatus::Degraded("messages are logged, not delivered".into()))
    }

    async fn shutdown(&self) -> Result<(), ElevqError> {
        Ok(())
    }
}

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ElevqError> {
        info!(recipient = %msg.recipient, actions = msg.actions.len(), text = %msg.text, "outbound message");
        Ok(())
    }
}
