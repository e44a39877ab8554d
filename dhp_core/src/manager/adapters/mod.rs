// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context adapters for the handoff manager.
//!
//! Each adapter is implemented by the embedding application against its own
//! storage and collaborators. The manager only ever talks to these traits, so
//! the core stays independent of any transport or database. For a reference
//! implementation of all of them see
//! [`crate::manager::context::memory::InMemoryContext`].

mod cache;
mod ledger;
mod offer;
mod pickup;
mod sinks;

pub use cache::ProofTokenCache;
pub use ledger::LedgerStore;
pub use offer::OfferSource;
pub use pickup::PickupStore;
pub use sinks::{EmailSink, NotificationSink};
