// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Donation Handoff Protocol core
//!
//! Coordinates the physical hand-off of donated material between a donor and a
//! receiver (an NGO or a compost agency): an accepted donation offer becomes a
//! [`pickup::PickupRecord`], the scheduling exchange moves it to a confirmed
//! date, and the QR proof-of-completion exchange closes it out and credits the
//! donor's points ledger.
//!
//! ## Getting started
//!
//! Take a look at the [`manager`] module to see how to drive the lifecycle and
//! which adapters the surrounding application needs to implement. The
//! reference [`manager::context::memory::InMemoryContext`] implements all of
//! them and backs the test suite.

pub mod error;
pub mod event;
pub mod manager;
pub mod pickup;

pub use error::{Error, Result};
