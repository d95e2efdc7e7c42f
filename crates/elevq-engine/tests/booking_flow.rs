// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the booking lifecycle and the offer protocol.
//!
//! Each test creates an isolated TestHarness with a temp SQLite database, a
//! capturing transport and a fixed clock (06:00 UTC on a Monday).

use std::sync::Arc;

use chrono::Duration;
use elevq_core::{ActionToken, BookingId, BookingStatus, ElevqError, RecipientHandle};
use elevq_engine::BookingRequest;
use elevq_test_utils::TestHarness;

const ALICE: i64 = 100;
const BOB: i64 = 200;
const CAROL: i64 = 300;

async fn position(h: &TestHarness, id: BookingId) -> Option<u32> {
    h.engine.booking(id).await.unwrap().booking.queue_position
}

// ---- Slots ----

#[tokio::test]
async fn four_hour_window_yields_four_hourly_slots() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 5).await.unwrap();
    let tomorrow = h.today().succ_opt().unwrap();

    let slots = h.engine.available_slots(elevator.id, tomorrow).await.unwrap();
    let starts: Vec<_> = slots.iter().map(|s| h.engine.settings().local_hm(s.start)).collect();
    assert_eq!(starts, ["08:00", "09:00", "10:00", "11:00"]);
    assert_eq!(h.engine.settings().local_hm(slots[3].end), "12:00");
}

#[tokio::test]
async fn taken_and_past_slots_are_hidden() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    h.book(ALICE, &elevator, today, "11:00", "A111AA").await.unwrap();

    h.clock.set(h.at(today, "09:30"));
    let slots = h.engine.available_slots(elevator.id, today).await.unwrap();
    let starts: Vec<_> = slots.iter().map(|s| h.engine.settings().local_hm(s.start)).collect();
    assert_eq!(starts, ["10:00"]);

    // Past-time filtering applies to the current day only.
    let tomorrow = today.succ_opt().unwrap();
    assert_eq!(h.engine.available_slots(elevator.id, tomorrow).await.unwrap().len(), 4);
}

// ---- Create ----

#[tokio::test]
async fn creating_a_booking_confirms_and_notifies() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let booking = h
        .book(ALICE, &elevator, h.today(), "09:00", "  A123BC ")
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.license_plate, "A123BC");
    assert_eq!(booking.queue_position, Some(0));
    assert_eq!(booking.last_notified_position, Some(0));

    let sent = h.transport.sent_to(RecipientHandle(ALICE)).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("A123BC"));
    assert!(sent[0].text.contains("09:00-10:00"));
}

#[tokio::test]
async fn booking_an_off_grid_or_past_slot_is_rejected() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();

    let err = h.book(ALICE, &elevator, today, "09:15", "A1").await.unwrap_err();
    assert!(matches!(err, ElevqError::Validation(_)), "got {err:?}");

    let err = h
        .book(ALICE, &elevator, today.pred_opt().unwrap(), "09:00", "A1")
        .await
        .unwrap_err();
    assert!(matches!(err, ElevqError::Validation(_)), "got {err:?}");

    let err = h.book(ALICE, &elevator, today, "09:00", "   ").await.unwrap_err();
    assert!(matches!(err, ElevqError::Validation(_)), "got {err:?}");

    h.clock.set(h.at(today, "09:30"));
    let err = h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap_err();
    assert!(matches!(err, ElevqError::Conflict(_)), "got {err:?}");

    assert!(h.engine.board(None, today, today).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_bookings_of_one_slot_yield_one_conflict() {
    let h = Arc::new(TestHarness::new().await.unwrap());
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();

    let request = |handle: i64, plate: &str| BookingRequest {
        handle: RecipientHandle(handle),
        display_name: None,
        elevator_id: elevator.id,
        day: today,
        slot_start: h.at(today, "10:00"),
        license_plate: plate.to_string(),
    };
    let (first, second) = (request(ALICE, "A1"), request(BOB, "B2"));

    let h1 = Arc::clone(&h);
    let h2 = Arc::clone(&h);
    let (a, b) = tokio::join!(
        tokio::spawn(async move { h1.engine.create_booking(first).await }),
        tokio::spawn(async move { h2.engine.create_booking(second).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let confirmed = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ElevqError::Conflict(_))))
        .count();
    assert_eq!((confirmed, conflicts), (1, 1));
    assert_eq!(h.engine.board(None, today, today).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_delivery_does_not_undo_the_booking() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    h.transport.set_failing(true);

    let booking = h.book(ALICE, &elevator, h.today(), "08:00", "A1").await.unwrap();

    assert_eq!(h.transport.sent_count().await, 0);
    let stored = h.engine.booking(booking.id).await.unwrap();
    assert_eq!(stored.booking.status, BookingStatus::Confirmed);
    assert_eq!(stored.elevator, "North");
}

// ---- Queue ----

#[tokio::test]
async fn arrived_runner_up_swaps_with_absent_head() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let a = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    let b = h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();
    let c = h.book(CAROL, &elevator, today, "10:00", "C3").await.unwrap();

    h.clock.set(h.at(today, "07:50"));
    let arrived = h.engine.mark_arrived(b.id).await.unwrap();
    assert!(arrived.arrived_at.is_some());
    assert!(!arrived.is_late());

    assert_eq!(position(&h, b.id).await, Some(0));
    assert_eq!(position(&h, a.id).await, Some(1));
    assert_eq!(position(&h, c.id).await, Some(2));
}

#[tokio::test]
async fn created_then_cancelled_leaves_an_empty_queue() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let booking = h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();

    let transition = h.engine.cancel(booking.id).await.unwrap();
    assert_eq!(transition.booking.status, BookingStatus::Cancelled);
    assert!(transition.offer.is_none());

    assert!(h.engine.board(Some(elevator.id), today, today).await.unwrap().is_empty());
    let report = h.engine.notify_tick().await.unwrap();
    assert_eq!(report.scanned, 0);

    // The slot is free again.
    h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();
}

#[tokio::test]
async fn terminal_bookings_reject_transitions() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let booking = h.book(ALICE, &elevator, h.today(), "09:00", "A1").await.unwrap();

    let err = h.engine.mark_unloaded(booking.id).await.unwrap_err();
    assert!(matches!(
        err,
        ElevqError::InvalidTransition { from: BookingStatus::Confirmed, .. }
    ));

    h.engine.mark_arrived(booking.id).await.unwrap();
    h.engine.mark_unloaded(booking.id).await.unwrap();

    let err = h.engine.cancel(booking.id).await.unwrap_err();
    assert!(matches!(
        err,
        ElevqError::InvalidTransition { from: BookingStatus::Unloaded, .. }
    ));
    let stored = h.engine.booking(booking.id).await.unwrap().booking;
    assert_eq!(stored.status, BookingStatus::Unloaded);
    assert!(stored.cancelled_at.is_none());

    let err = h.engine.mark_arrived(BookingId(999)).await.unwrap_err();
    assert!(matches!(err, ElevqError::NotFound { entity: "booking", .. }));
}

// ---- Offers ----

/// Three bookings at 08, 09 and 10; the 08:00 truck arrives and unloads.
async fn unload_head(h: &TestHarness) -> [BookingId; 3] {
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let a = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    let b = h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();
    let c = h.book(CAROL, &elevator, today, "10:00", "C3").await.unwrap();

    h.clock.set(h.at(today, "08:00"));
    h.engine.mark_arrived(a.id).await.unwrap();
    h.clock.set(h.at(today, "08:20"));
    h.transport.clear_sent().await;
    h.engine.mark_unloaded(a.id).await.unwrap();
    [a.id, b.id, c.id]
}

#[tokio::test]
async fn unloading_offers_the_slot_to_the_new_head() {
    let h = TestHarness::new().await.unwrap();
    let [_, b, c] = unload_head(&h).await;

    let sent = h.transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, RecipientHandle(BOB));
    let tokens: Vec<_> = sent[0].actions.iter().map(|a| a.token.clone()).collect();
    assert_eq!(
        tokens,
        [
            ActionToken::OfferAccept(b),
            ActionToken::OfferDecline { booking: b, fallback: Some(c) },
        ]
    );
    assert_eq!(position(&h, b).await, Some(0));
    assert_eq!(position(&h, c).await, Some(1));
}

#[tokio::test]
async fn unloaded_booking_gives_up_its_queue_position() {
    let h = TestHarness::new().await.unwrap();
    let [a, b, c] = unload_head(&h).await;
    let today = h.today();

    let positions = |board: Vec<elevq_engine::BookingCard>| {
        board
            .into_iter()
            .map(|card| (card.booking.id, card.booking.queue_position))
            .collect::<Vec<_>>()
    };
    let board = h.engine.board(None, today, today).await.unwrap();
    assert_eq!(positions(board), [(a, None), (b, Some(0)), (c, Some(1))]);

    // A full pass leaves the unloaded booking without a position.
    h.engine.notify_tick().await.unwrap();
    let board = h.engine.board(None, today, today).await.unwrap();
    assert_eq!(positions(board), [(a, None), (b, Some(0)), (c, Some(1))]);
}

#[tokio::test]
async fn failed_offer_delivery_does_not_undo_the_unload() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let a = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    let b = h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();

    h.clock.set(h.at(today, "08:00"));
    h.engine.mark_arrived(a.id).await.unwrap();
    h.transport.clear_sent().await;
    h.transport.set_failing(true);

    let transition = h.engine.mark_unloaded(a.id).await.unwrap();
    assert_eq!(transition.booking.status, BookingStatus::Unloaded);
    assert_eq!(transition.booking.queue_position, None);
    assert_eq!(transition.offer.map(|o| o.candidate), Some(b.id));
    assert_eq!(h.transport.sent_count().await, 0);

    let stored = h.engine.booking(a.id).await.unwrap().booking;
    assert_eq!(stored.status, BookingStatus::Unloaded);
    assert!(stored.unloaded_at.is_some());
    assert_eq!(position(&h, b.id).await, Some(0));
}

#[tokio::test]
async fn declined_offer_goes_to_the_fallback_once() {
    let h = TestHarness::new().await.unwrap();
    let [_, b, c] = unload_head(&h).await;
    h.transport.clear_sent().await;

    let forwarded = h
        .engine
        .decline_offer(RecipientHandle(BOB), b, Some(c))
        .await
        .unwrap();
    assert_eq!(forwarded, Some(c));

    let sent = h.transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, RecipientHandle(CAROL));
    assert!(sent[0]
        .actions
        .iter()
        .any(|a| a.token == ActionToken::OfferDecline { booking: c, fallback: None }));

    // Carol declining ends the cascade.
    h.transport.clear_sent().await;
    let forwarded = h
        .engine
        .decline_offer(RecipientHandle(CAROL), c, None)
        .await
        .unwrap();
    assert_eq!(forwarded, None);
    assert_eq!(h.transport.sent_count().await, 0);
}

#[tokio::test]
async fn accepted_offer_moves_the_slot_to_now() {
    let h = TestHarness::new().await.unwrap();
    let [_, b, _] = unload_head(&h).await;
    h.transport.clear_sent().await;

    let now = h.engine.now();
    let booking = h.engine.accept_offer(RecipientHandle(BOB), b).await.unwrap();
    assert_eq!(booking.slot_start, now);
    assert_eq!(booking.slot_end, now + Duration::minutes(60));
    assert_eq!(booking.queue_position, Some(0));

    let sent = h.transport.sent_to(RecipientHandle(BOB)).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("08:20-09:20"));
}

#[tokio::test]
async fn offer_responses_from_other_drivers_are_rejected() {
    let h = TestHarness::new().await.unwrap();
    let [_, b, c] = unload_head(&h).await;
    h.transport.clear_sent().await;
    let before = h.engine.booking(b).await.unwrap().booking;

    let err = h
        .engine
        .accept_offer(RecipientHandle(CAROL), b)
        .await
        .unwrap_err();
    assert!(matches!(err, ElevqError::Validation(_)));
    let err = h
        .engine
        .decline_offer(RecipientHandle(CAROL), b, Some(c))
        .await
        .unwrap_err();
    assert!(matches!(err, ElevqError::Validation(_)));

    assert_eq!(h.engine.booking(b).await.unwrap().booking, before);
    assert_eq!(h.transport.sent_count().await, 0);
}

#[tokio::test]
async fn cancelling_the_head_offers_its_slot() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let a = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    let b = h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();
    let c = h.book(CAROL, &elevator, today, "10:00", "C3").await.unwrap();
    h.transport.clear_sent().await;

    // Not the head: no offer.
    let transition = h.engine.cancel(c.id).await.unwrap();
    assert!(transition.offer.is_none());
    assert_eq!(h.transport.sent_count().await, 0);

    let transition = h.engine.cancel(a.id).await.unwrap();
    let offer = transition.offer.unwrap();
    assert_eq!(offer.candidate, b.id);
    assert_eq!(offer.fallback, None);
    assert_eq!(h.transport.sent_to(RecipientHandle(BOB)).await.len(), 1);
}

// ---- Reads ----

#[tokio::test]
async fn driver_sees_own_live_bookings_only() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let kept = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    let dropped = h.book(ALICE, &elevator, today, "09:00", "A1").await.unwrap();
    h.book(BOB, &elevator, today, "10:00", "B2").await.unwrap();
    h.engine.cancel(dropped.id).await.unwrap();

    let mine = h.engine.driver_bookings(RecipientHandle(ALICE)).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].booking.id, kept.id);
    assert_eq!(mine[0].elevator, "North");

    assert!(h
        .engine
        .driver_bookings(RecipientHandle(999))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn export_lists_every_booking_of_the_day() {
    let h = TestHarness::new().await.unwrap();
    let elevator = h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let today = h.today();
    let a = h.book(ALICE, &elevator, today, "08:00", "A1").await.unwrap();
    h.book(BOB, &elevator, today, "09:00", "B2").await.unwrap();

    h.clock.set(h.at(today, "08:10"));
    h.engine.mark_arrived(a.id).await.unwrap();
    h.engine.mark_unloaded(a.id).await.unwrap();

    let csv = String::from_utf8(h.engine.export_day(None, today).await.unwrap()).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], "license_plate,slot_start,slot_end,is_late,unloaded");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("A1,"));
    assert!(lines[1].ends_with(",true,true"));
    assert!(lines[2].ends_with(",false,false"));
}

#[tokio::test]
async fn duplicate_elevator_names_conflict() {
    let h = TestHarness::new().await.unwrap();
    h.add_elevator("North", "08:00", "12:00", 4).await.unwrap();
    let err = h.add_elevator("North", "09:00", "17:00", 8).await.unwrap_err();
    assert!(matches!(err, ElevqError::Conflict(_)));

    let err = h.add_elevator("South", "12:00", "08:00", 4).await.unwrap_err();
    assert!(matches!(err, ElevqError::Validation(_)));

    let found = h.engine.elevator_by_name("North").await.unwrap();
    assert_eq!(found.bookable_slots_per_day, 4);
    assert_eq!(h.engine.elevators().await.unwrap().len(), 1);
}
