// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; the binary decides which recorder (if any)
//! collects them.

use metrics::{describe_counter, describe_histogram};

/// Register all elevq metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("elevq_bookings_created_total", "Bookings confirmed");
    describe_counter!(
        "elevq_booking_conflicts_total",
        "Booking attempts rejected because the slot was taken"
    );
    describe_counter!("elevq_transitions_total", "Booking status transitions");
    describe_counter!("elevq_offers_sent_total", "Early-slot offers sent");
    describe_counter!("elevq_notifications_sent_total", "Ledgered driver notifications");
    describe_counter!(
        "elevq_transport_failures_total",
        "Messages the transport failed to deliver"
    );
    describe_histogram!(
        "elevq_notification_tick_seconds",
        "Duration of one notification scheduler pass"
    );
}

pub fn record_booking_created() {
    metrics::counter!("elevq_bookings_created_total").increment(1);
}

pub fn record_conflict() {
    metrics::counter!("elevq_booking_conflicts_total").increment(1);
}

pub fn record_transition(to: &'static str) {
    metrics::counter!("elevq_transitions_total", "to" => to).increment(1);
}

pub fn record_offer() {
    metrics::counter!("elevq_offers_sent_total").increment(1);
}

pub fn record_notification(kind: &'static str) {
    metrics::counter!("elevq_notifications_sent_total", "kind" => kind).increment(1);
}

pub fn record_transport_failure() {
    metrics::counter!("elevq_transport_failures_total").increment(1);
}

pub fn record_tick(seconds: f64) {
    metrics::histogram!("elevq_notification_tick_seconds").record(seconds);
}
