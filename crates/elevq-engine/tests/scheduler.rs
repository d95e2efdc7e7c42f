// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification scheduler tests: reminders, queue updates and the ledger.

use chrono::{Duration, TimeZone, Utc};
use elevq_core::RecipientHandle;
use elevq_test_utils::TestHarness;

const ALICE: i64 = 100;
const BOB: i64 = 200;

#[tokio::test]
async fn reminders_fire_once_per_offset() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();
    h.transport.clear_sent().await;

    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.reminders, 0);

    h.clock.set(h.at(today, "08:05"));
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.reminders, 1);
    let sent = h.transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("starts in 55 min"), "{}", sent[0].text);

    h.advance(Duration::minutes(1));
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 0);

    h.clock.set(h.at(today, "08:35"));
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 1);

    h.clock.set(h.at(today, "08:50"));
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 0);

    // The slot has started.
    h.clock.set(h.at(today, "09:00"));
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 0);
    assert_eq!(h.transport.sent_count().await, 2);
}

#[tokio::test]
async fn only_the_smallest_due_offset_is_sent_per_tick() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();
    h.transport.clear_sent().await;

    // Both the 60 and 30 minute thresholds are crossed at once.
    h.clock.set(h.at(today, "08:40"));
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.reminders, 1);
    assert!(h.transport.sent_messages().await[0].text.contains("20 min"));

    // The skipped offset is still absent from the ledger, so it follows on
    // the next pass; after that everything is recorded.
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 1);
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 0);
}

#[tokio::test]
async fn no_offsets_means_no_reminders() {
    let h = TestHarness::builder()
        .with_reminder_offsets(vec![])
        .build()
        .await
        .unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();

    h.clock.set(h.at(today, "08:59"));
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.reminders, 0);
}

#[tokio::test]
async fn failed_reminder_is_not_retried() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();
    h.transport.clear_sent().await;

    h.transport.set_failing(true);
    h.clock.set(h.at(today, "08:05"));
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!((report.reminders, report.delivered), (1, 0));

    h.transport.set_failing(false);
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.reminders, 0);
    assert_eq!(h.transport.sent_count().await, 0);
}

#[tokio::test]
async fn queue_moves_are_reported_once() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let a = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();

    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.days_recalculated, 1);
    assert_eq!(report.queue_updates, 0);

    h.engine.cancel(a.id).await.unwrap();
    h.transport.clear_sent().await;

    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.queue_updates, 1);
    let sent = h.transport.sent_to(RecipientHandle(BOB)).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("you are next in line"));

    assert_eq!(h.engine.notify_tick().await.unwrap().queue_updates, 0);
}

#[tokio::test]
async fn slots_follow_the_configured_timezone() {
    let h = TestHarness::builder()
        .with_timezone(chrono_tz::Europe::Moscow)
        .with_now(Utc.with_ymd_and_hms(2026, 3, 2, 3, 0, 0).unwrap())
        .build()
        .await
        .unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();

    let booking = h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();
    assert_eq!(booking.slot_start, Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap());
    assert!(h.transport.sent_messages().await[0].text.contains("09:00-10:00"));

    // 05:10 UTC is 08:10 in Moscow: 50 minutes to go.
    h.clock.set(Utc.with_ymd_and_hms(2026, 3, 2, 5, 10, 0).unwrap());
    assert_eq!(h.engine.notify_tick().await.unwrap().reminders, 1);
}

#[tokio::test]
async fn one_failing_booking_does_not_stop_the_pass() {
    let h = TestHarness::new().await.unwrap();
    let north = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let south = h.add_elevator("South", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let broken = h.book(ALICE, &north, today, "08:00", "A1").await.unwrap();
    h.book(BOB, &south, today, "08:00", "B2").await.unwrap();
    h.orphan_booking(broken.id).await.unwrap();
    h.transport.clear_sent().await;

    h.clock.set(h.at(today, "07:45"));
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(report.reminders, 1);

    let sent = h.transport.sent_to(RecipientHandle(BOB)).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("starts in 15 min"), "{}", sent[0].text);
    assert!(h.transport.sent_to(RecipientHandle(ALICE)).await.is_empty());
}
