// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as a parseable timezone or a listen address.

use crate::diagnostic::ConfigError;
use crate::model::ElevqConfig;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Largest offset that still converts to a `chrono` duration.
const MAX_OFFSET_MINUTES: i64 = i64::MAX / 60_000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
///
/// A slot duration outside one day or an empty reminder list is accepted:
/// the engine then produces no slots or no reminders. Those only warn.
pub fn validate_config(config: &ElevqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.queue.timezone.parse::<chrono_tz::Tz>().is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.timezone `{}` is not a known IANA timezone",
                config.queue.timezone
            ),
        });
    }

    if config.queue.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if !(1..=MINUTES_PER_DAY).contains(&config.queue.slot_duration_minutes) {
        tracing::warn!(
            slot_duration_minutes = config.queue.slot_duration_minutes,
            "slot duration is not between 1 minute and a day, no slots will be offered"
        );
    }

    let oversized: Vec<i64> = config
        .queue
        .reminder_offsets_minutes
        .iter()
        .copied()
        .filter(|m| *m > MAX_OFFSET_MINUTES)
        .collect();
    if !oversized.is_empty() {
        tracing::warn!(offsets = ?oversized, "reminder offsets too large, they are ignored");
    }

    if !config
        .queue
        .reminder_offsets_minutes
        .iter()
        .any(|m| (1..=MAX_OFFSET_MINUTES).contains(m))
    {
        tracing::warn!("no positive reminder offsets configured, reminders are disabled");
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    for (key, token) in [
        ("telegram.driver_bot_token", &config.telegram.driver_bot_token),
        (
            "telegram.dispatcher_bot_token",
            &config.telegram.dispatcher_bot_token,
        ),
    ] {
        if let Some(token) = token
            && token.trim().is_empty()
        {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty when set"),
            });
        }
    }

    if config.metrics.enabled
        && config
            .metrics
            .listen_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "metrics.listen_address `{}` is not a valid socket address",
                config.metrics.listen_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
