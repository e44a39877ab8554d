// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The `manager` module is the primary interface for driving the pickup
//! lifecycle: offer acceptance, date scheduling, QR proof-of-completion and
//! points crediting all go through the [`Manager`].
//!
//! The `Manager` uses user-defined adapters (see [`adapters`]) for storage,
//! the upstream offer collaborator, the points ledger and the best-effort
//! notification/email sinks. This keeps the core free of any transport or
//! database choice; the surrounding application decides both.

pub mod adapters;
#[cfg(feature = "in_memory")]
pub mod context;
mod handoff_manager;

pub use handoff_manager::{GeneratedToken, Manager, ManagerConfig};
