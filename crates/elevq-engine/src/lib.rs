// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The booking queue engine.
//!
//! [`BookingEngine`] ties the pure pieces together: the slot grid
//! ([`slots`]), queue ordering ([`queue`]), status transitions
//! ([`lifecycle`]), early-slot offers ([`offer`]) and the reminder scheduler
//! ([`scheduler`]). Every read-modify-write sequence runs inside one
//! [`BookingStore::transaction`]; messages produced by it are handed to the
//! [`Transport`] only after the transaction committed, and delivery failures
//! are logged without undoing anything.

pub mod clock;
pub mod dispatch;
pub mod export;
pub mod lifecycle;
pub mod messages;
pub mod metrics;
pub mod offer;
pub mod queue;
pub mod scheduler;
pub mod settings;
pub mod slots;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use elevq_core::{
    Booking, BookingId, BookingStatus, BookingStore, Driver, Elevator, ElevatorId, ElevqError,
    NewElevator, OutboundMessage, RecipientHandle, Transport,
};
use tracing::{error, info};

pub use clock::{Clock, SystemClock};
pub use lifecycle::{BookingRequest, Outcome, Transition};
pub use offer::Offer;
pub use scheduler::TickReport;
pub use settings::EngineSettings;
pub use slots::Slot;

/// A booking with the names a human needs to read it.
#[derive(Debug, Clone)]
pub struct BookingCard {
    pub booking: Booking,
    pub elevator: String,
    pub driver: Option<Driver>,
}

/// The booking queue engine.
pub struct BookingEngine<S> {
    store: S,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    settings: Arc<EngineSettings>,
}

impl<S: BookingStore> BookingEngine<S> {
    pub fn new(
        store: S,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        self.settings.local_day(self.now())
    }

    async fn deliver(&self, outbox: Vec<OutboundMessage>) -> usize {
        dispatch::deliver(self.transport.as_ref(), outbox).await
    }

    // --- Elevators ---

    pub async fn elevators(&self) -> Result<Vec<Elevator>, ElevqError> {
        self.store.transaction(|repo| repo.elevators()).await
    }

    pub async fn elevator_by_name(&self, name: &str) -> Result<Elevator, ElevqError> {
        let name = name.to_string();
        self.store
            .transaction(move |repo| {
                repo.elevator_by_name(&name)?
                    .ok_or_else(|| ElevqError::not_found("elevator", name))
            })
            .await
    }

    pub async fn add_elevator(&self, elevator: NewElevator) -> Result<Elevator, ElevqError> {
        elevator.validate()?;
        let elevator = self
            .store
            .transaction(move |repo| repo.insert_elevator(&elevator))
            .await?;
        info!(elevator_id = %elevator.id, name = %elevator.name, "elevator added");
        Ok(elevator)
    }

    // --- Availability and reads ---

    /// Slots of `elevator` on `day` a driver can still pick.
    pub async fn available_slots(
        &self,
        elevator: ElevatorId,
        day: NaiveDate,
    ) -> Result<Vec<Slot>, ElevqError> {
        let settings = Arc::clone(&self.settings);
        let now = self.now();
        self.store
            .transaction(move |repo| {
                let elevator = lifecycle::load_elevator(repo, elevator)?;
                let existing = repo.bookings_for_day(elevator.id, day)?;
                Ok(slots::available_slots(&elevator, day, &existing, &settings, now))
            })
            .await
    }

    pub async fn booking(&self, id: BookingId) -> Result<BookingCard, ElevqError> {
        self.store
            .transaction(move |repo| {
                let booking = lifecycle::load_booking(repo, id)?;
                card(repo, booking)
            })
            .await
    }

    /// A driver's bookings that are not cancelled and ended at most a day ago.
    pub async fn driver_bookings(
        &self,
        handle: RecipientHandle,
    ) -> Result<Vec<BookingCard>, ElevqError> {
        let since = self.now() - Duration::days(1);
        self.store
            .transaction(move |repo| {
                let Some(driver) = repo.driver_by_handle(handle)? else {
                    return Ok(Vec::new());
                };
                repo.bookings_for_driver(driver.id, since)?
                    .into_iter()
                    .filter(|b| b.status != BookingStatus::Cancelled)
                    .map(|b| card(repo, b))
                    .collect()
            })
            .await
    }

    /// Non-cancelled bookings on days `from..=to`, optionally for one elevator.
    pub async fn board(
        &self,
        elevator: Option<ElevatorId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BookingCard>, ElevqError> {
        self.store
            .transaction(move |repo| {
                repo.bookings_between(elevator, from, to)?
                    .into_iter()
                    .filter(|b| b.status != BookingStatus::Cancelled)
                    .map(|b| card(repo, b))
                    .collect()
            })
            .await
    }

    /// CSV of every booking on `day` (all statuses), ordered by slot start.
    pub async fn export_day(
        &self,
        elevator: Option<ElevatorId>,
        day: NaiveDate,
    ) -> Result<Vec<u8>, ElevqError> {
        let bookings = self
            .store
            .transaction(move |repo| repo.bookings_between(elevator, day, day))
            .await?;
        export::bookings_to_csv(&bookings, &self.settings)
    }

    // --- Lifecycle ---

    /// Confirm a booking. A slot taken in the meantime yields
    /// [`ElevqError::Conflict`].
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, ElevqError> {
        let settings = Arc::clone(&self.settings);
        let now = self.now();
        let outcome = self
            .store
            .transaction(move |repo| lifecycle::create(repo, &settings, now, request))
            .await?;
        self.deliver(outcome.outbox).await;
        Ok(outcome.value)
    }

    pub async fn mark_arrived(&self, id: BookingId) -> Result<Booking, ElevqError> {
        let now = self.now();
        let outcome = self
            .store
            .transaction(move |repo| lifecycle::mark_arrived(repo, now, id))
            .await?;
        self.deliver(outcome.outbox).await;
        Ok(outcome.value)
    }

    pub async fn mark_unloaded(&self, id: BookingId) -> Result<Transition, ElevqError> {
        let settings = Arc::clone(&self.settings);
        let now = self.now();
        let outcome = self
            .store
            .transaction(move |repo| lifecycle::mark_unloaded(repo, &settings, now, id))
            .await?;
        self.deliver(outcome.outbox).await;
        Ok(outcome.value)
    }

    pub async fn cancel(&self, id: BookingId) -> Result<Transition, ElevqError> {
        let settings = Arc::clone(&self.settings);
        let now = self.now();
        let outcome = self
            .store
            .transaction(move |repo| lifecycle::cancel(repo, &settings, now, id))
            .await?;
        self.deliver(outcome.outbox).await;
        Ok(outcome.value)
    }

    // --- Offers ---

    pub async fn accept_offer(
        &self,
        responder: RecipientHandle,
        id: BookingId,
    ) -> Result<Booking, ElevqError> {
        let settings = Arc::clone(&self.settings);
        let now = self.now();
        let outcome = self
            .store
            .transaction(move |repo| offer::accept(repo, &settings, now, responder, id))
            .await?;
        self.deliver(outcome.outbox).await;
        Ok(outcome.value)
    }

    /// Returns the fallback booking the offer was forwarded to, if any.
    pub async fn decline_offer(
        &self,
        responder: RecipientHandle,
        id: BookingId,
        fallback: Option<BookingId>,
    ) -> Result<Option<BookingId>, ElevqError> {
        let settings = Arc::clone(&self.settings);
        let outcome = self
            .store
            .transaction(move |repo| offer::decline(repo, &settings, responder, id, fallback))
            .await?;
        self.deliver(outcome.outbox).await;
        Ok(outcome.value)
    }

    // --- Scheduler ---

    /// One notification pass over all queued bookings.
    ///
    /// Queues are refreshed first. Each booking is then handled in its own
    /// transaction; a failure is logged and counted and the pass continues.
    pub async fn notify_tick(&self) -> Result<TickReport, ElevqError> {
        let started = Instant::now();
        let now = self.now();
        let mut report = TickReport {
            days_recalculated: self
                .store
                .transaction(|repo| scheduler::refresh_queues(repo))
                .await?,
            ..TickReport::default()
        };

        let ids = self
            .store
            .transaction(|repo| repo.queued_booking_ids())
            .await?;
        for id in ids {
            let settings = Arc::clone(&self.settings);
            let scan = self
                .store
                .transaction(move |repo| scheduler::scan_booking(repo, &settings, now, id))
                .await;
            report.scanned += 1;
            match scan {
                Ok(scan) => {
                    report.reminders += usize::from(scan.reminder.is_some());
                    report.queue_updates += usize::from(scan.queue_update);
                    report.delivered += self.deliver(scan.outbox).await;
                }
                Err(e) => {
                    report.failures += 1;
                    error!(booking_id = %id, error = %e, "notification scan failed");
                }
            }
        }

        metrics::record_tick(started.elapsed().as_secs_f64());
        Ok(report)
    }
}

fn card(
    repo: &dyn elevq_core::BookingRepository,
    booking: Booking,
) -> Result<BookingCard, ElevqError> {
    let elevator = lifecycle::load_elevator(repo, booking.elevator_id)?;
    let driver = repo.driver(booking.driver_id)?;
    Ok(BookingCard {
        booking,
        elevator: elevator.name,
        driver,
    })
}
