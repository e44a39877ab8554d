// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Pickup lifecycle states
//!
//! A pickup moves strictly forward:
//!
//! `Pending → DatesProposed → Scheduled → QrRequested → QrAccepted → Completed`
//!
//! with `Cancelled` reachable from every non-terminal state except
//! `QrAccepted`. `Completed` and `Cancelled` are terminal.
//!
//! Completion is valid from `Scheduled`, `QrRequested` and `QrAccepted`: the
//! QR-request acknowledgement steps are optional, a donor may generate a token
//! straight from `Scheduled`.
//!
//! [`OfferStatus`] is a separate enum on purpose. The upstream offer and the
//! pickup have unrelated state machines and their values must not be
//! comparable.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`super::PickupRecord`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PickupState {
    Pending,
    DatesProposed,
    Scheduled,
    QrRequested,
    QrAccepted,
    Completed,
    Cancelled,
}

impl PickupState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PickupState::Completed | PickupState::Cancelled)
    }

    /// States from which the receiver may (re-)submit a proposal list.
    pub fn allows_proposal(&self) -> bool {
        matches!(self, PickupState::Pending | PickupState::DatesProposed)
    }

    /// States from which either party may cancel.
    pub fn allows_cancellation(&self) -> bool {
        matches!(
            self,
            PickupState::Pending
                | PickupState::DatesProposed
                | PickupState::Scheduled
                | PickupState::QrRequested
        )
    }

    /// States from which a proof token may be generated and the pickup
    /// completed. All of them carry a confirmed date.
    pub fn allows_completion(&self) -> bool {
        matches!(
            self,
            PickupState::Scheduled | PickupState::QrRequested | PickupState::QrAccepted
        )
    }

    /// Whether records in this state must carry a confirmed date.
    pub fn requires_confirmed_date(&self) -> bool {
        self.allows_completion() || matches!(self, PickupState::Completed)
    }
}

/// Status of the upstream donation offer, as reported by the offer
/// collaborator. Only `Accepted` offers spawn pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}
