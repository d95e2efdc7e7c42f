// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine settings derived from the `[queue]` configuration section.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use elevq_config::model::QueueConfig;
use elevq_core::ElevqError;

/// Longest slot that still fits into one day.
const MAX_SLOT_MINUTES: i64 = 24 * 60;

/// Immutable settings threaded into every engine component.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    timezone: Tz,
    slot_duration_minutes: i64,
    /// Positive, deduplicated, ascending.
    reminder_offsets: Vec<i64>,
}

impl EngineSettings {
    /// Build settings, normalizing the reminder offsets.
    ///
    /// Non-positive offsets and offsets too large to express as a duration
    /// are dropped. An unusable slot duration is kept as-is and simply
    /// yields no slots.
    pub fn new(timezone: Tz, slot_duration_minutes: i64, reminder_offsets: &[i64]) -> Self {
        let mut offsets: Vec<i64> = reminder_offsets
            .iter()
            .copied()
            .filter(|m| *m > 0 && Duration::try_minutes(*m).is_some())
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        Self {
            timezone,
            slot_duration_minutes,
            reminder_offsets: offsets,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Result<Self, ElevqError> {
        let timezone = config.timezone.parse::<Tz>().map_err(|_| {
            ElevqError::Config(format!("unknown timezone `{}`", config.timezone))
        })?;
        Ok(Self::new(
            timezone,
            config.slot_duration_minutes,
            &config.reminder_offsets_minutes,
        ))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn slot_duration_minutes(&self) -> i64 {
        self.slot_duration_minutes
    }

    /// The slot length, or `None` unless it is positive and fits into a day.
    pub fn slot_duration(&self) -> Option<Duration> {
        (1..=MAX_SLOT_MINUTES)
            .contains(&self.slot_duration_minutes)
            .then(|| Duration::minutes(self.slot_duration_minutes))
    }

    /// Reminder offsets in minutes, smallest first.
    pub fn reminder_offsets(&self) -> &[i64] {
        &self.reminder_offsets
    }

    /// The calendar day `instant` falls on in the configured timezone.
    pub fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// UTC instant of a local wall-clock time, or `None` when it falls into
    /// a DST gap. Ambiguous times resolve to the earlier instant.
    pub fn to_utc(&self, day: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&day.and_time(time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }

    /// Render an instant as local `HH:MM`.
    pub fn local_hm(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.timezone).format("%H:%M").to_string()
    }
}
