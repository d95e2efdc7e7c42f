// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./elevq.toml` > `~/.config/elevq/elevq.toml` > `/etc/elevq/elevq.toml`
//! with environment variable overrides via `ELEVQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ElevqConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/elevq/elevq.toml";
pub(crate) const USER_CONFIG: &str = "elevq/elevq.toml";
pub(crate) const LOCAL_CONFIG: &str = "elevq.toml";

/// Top-level sections, used to split `ELEVQ_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &["queue", "telegram", "storage", "logging", "metrics"];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/elevq/elevq.toml` (system-wide)
/// 3. `~/.config/elevq/elevq.toml` (user XDG config)
/// 4. `./elevq.toml` (local directory)
/// 5. `explicit`, when given on the command line
/// 6. `ELEVQ_*` environment variables
pub fn load_config(explicit: Option<&Path>) -> Result<ElevqConfig, figment::Error> {
    build_figment(explicit).extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ElevqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ElevqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(ElevqConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(USER_CONFIG))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG));
    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Maps a lowercased, prefix-stripped env key onto its dotted config path.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `telegram_driver_bot_token` maps to `telegram.driver_bot_token` rather
/// than `telegram.driver.bot.token`.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("ELEVQ_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(
            map_env_key("telegram_driver_bot_token"),
            "telegram.driver_bot_token"
        );
        assert_eq!(
            map_env_key("queue_reminder_offsets_minutes"),
            "queue.reminder_offsets_minutes"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
