// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for elevq integration tests.
//!
//! Provides a capturing transport, a hand-driven clock and a harness that
//! wires both to a booking engine backed by a temporary SQLite file.
//!
//! # Components
//!
//! - [`MockTransport`] - Captures outbound messages, can be switched to fail
//! - [`FixedClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Engine plus temp database plus the two mocks

pub mod clock;
pub mod harness;
pub mod mock_transport;

pub use clock::FixedClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_transport::MockTransport;
