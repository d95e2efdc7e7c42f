// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level elevq configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ElevqConfig {
    /// Booking queue settings consumed by the engine.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Telegram bot tokens and dispatcher allow-list.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Booking queue settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// IANA timezone the elevators operate in. Days and work windows are
    /// interpreted in this zone.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Length of one slot. Zero or negative produces no slots.
    #[serde(default = "default_slot_duration_minutes")]
    pub slot_duration_minutes: i64,

    /// Minutes before slot start at which reminders are sent. Non-positive
    /// entries are ignored.
    #[serde(default = "default_reminder_offsets_minutes")]
    pub reminder_offsets_minutes: Vec<i64>,

    /// Seconds between notification scheduler ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            slot_duration_minutes: default_slot_duration_minutes(),
            reminder_offsets_minutes: default_reminder_offsets_minutes(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

fn default_slot_duration_minutes() -> i64 {
    60
}

fn default_reminder_offsets_minutes() -> Vec<i64> {
    vec![60, 30]
}

fn default_poll_interval_secs() -> u64 {
    30
}

/// Telegram bot configuration. A missing token disables that bot.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Token of the driver-facing bot.
    #[serde(default)]
    pub driver_bot_token: Option<String>,

    /// Token of the dispatcher-facing bot.
    #[serde(default)]
    pub dispatcher_bot_token: Option<String>,

    /// Telegram user ids or usernames allowed to use the dispatcher bot.
    /// Empty allows everyone.
    #[serde(default)]
    pub allowed_dispatchers: Vec<String>,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "elevq.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Socket address the exporter listens on.
    #[serde(default = "default_metrics_listen_address")]
    pub listen_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: default_metrics_listen_address(),
        }
    }
}

fn default_metrics_listen_address() -> String {
    "127.0.0.1:9464".to_string()
}
