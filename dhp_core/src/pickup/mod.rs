// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Pickup records
//!
//! The [`PickupRecord`] tracks one physical hand-off from offer acceptance to
//! completion or cancellation. It is mutated exclusively through the
//! [`crate::manager::Manager`] transitions; the methods here are the
//! invariant-preserving pieces those transitions are built from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod state;

pub use state::{OfferStatus, PickupState};

/// A party to a pickup: donor, NGO or compost agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId(Uuid);

/// Identity of one pickup record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickupId(Uuid);

/// Identity of the upstream donation offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(PartyId);
uuid_id!(PickupId);
uuid_id!(OfferId);

/// What kind of receiver is collecting, which decides the classification tag
/// space (waste types vs item types) and the base point multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReceiverKind {
    Ngo,
    CompostAgency,
}

/// Snapshot of the upstream offer as reported by the offer collaborator.
/// The core consumes its parties, quantity and tags at creation time only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSnapshot {
    pub id: OfferId,
    pub donor: PartyId,
    pub receiver: PartyId,
    pub receiver_kind: ReceiverKind,
    pub quantity: u32,
    pub tags: Vec<String>,
    pub status: OfferStatus,
}

/// One `{date, time slot}` pair submitted by the receiver, as the caller
/// provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateProposal {
    pub date: NaiveDate,
    pub time_slot: String,
}

/// A stored candidate. The `candidate_id` is the identity the donor confirms
/// by, so confirmation never re-parses a date value and cannot be bitten by
/// timezone ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCandidate {
    pub candidate_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
}

impl DateCandidate {
    pub fn from_proposal(proposal: DateProposal) -> Self {
        Self {
            candidate_id: Uuid::new_v4(),
            date: proposal.date,
            time_slot: proposal.time_slot,
        }
    }
}

/// Status of one issued proof token entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QrStatus {
    Active,
    Used,
    Expired,
}

/// Bookkeeping for one issued proof token. Entries are append-only; status
/// only ever tightens (`Active → Used` or `Active → Expired`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeEntry {
    /// The encoded token as handed to the donor.
    pub code: String,
    pub generated_at_ms: u64,
    pub expires_at_ms: u64,
    pub status: QrStatus,
    pub scanned_at_ms: Option<u64>,
    pub scanned_by: Option<PartyId>,
}

/// Details the receiver supplies when closing out a pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionDetails {
    pub notes: Option<String>,
    /// Bonus points layered on top of the base credit already applied at
    /// offer acceptance. Zero means no bonus write at all.
    pub additional_points: u64,
}

/// The state machine entity for one physical hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupRecord {
    pub id: PickupId,
    pub offer_id: OfferId,
    pub donor: PartyId,
    pub receiver: PartyId,
    pub receiver_kind: ReceiverKind,
    pub quantity: u32,
    pub tags: Vec<String>,
    pub state: PickupState,
    pub proposed_dates: Vec<DateCandidate>,
    pub confirmed_date: Option<DateCandidate>,
    pub qr_codes: Vec<QrCodeEntry>,
    pub qr_generation_attempts: u8,
    pub completed_at_ms: Option<u64>,
    pub completed_by: Option<PartyId>,
    pub completion_notes: Option<String>,
    pub additional_points: u64,
    pub created_at_ms: u64,
    /// Compare-and-swap version; bumped on every persisted mutation.
    pub version: u64,
}

impl PickupRecord {
    /// A fresh record in `Pending`, spawned by an accepted offer.
    pub fn from_offer(offer: &OfferSnapshot, now_ms: u64) -> Self {
        Self {
            id: PickupId::random(),
            offer_id: offer.id,
            donor: offer.donor,
            receiver: offer.receiver,
            receiver_kind: offer.receiver_kind,
            quantity: offer.quantity,
            tags: offer.tags.clone(),
            state: PickupState::Pending,
            proposed_dates: Vec::new(),
            confirmed_date: None,
            qr_codes: Vec::new(),
            qr_generation_attempts: 0,
            completed_at_ms: None,
            completed_by: None,
            completion_notes: None,
            additional_points: 0,
            created_at_ms: now_ms,
            version: 0,
        }
    }

    pub fn is_party(&self, party: PartyId) -> bool {
        party == self.donor || party == self.receiver
    }

    /// The counterparty of `party`, if `party` is one of the two parties.
    pub fn other_party(&self, party: PartyId) -> Option<PartyId> {
        if party == self.donor {
            Some(self.receiver)
        } else if party == self.receiver {
            Some(self.donor)
        } else {
            None
        }
    }

    pub fn candidate(&self, candidate_id: Uuid) -> Option<&DateCandidate> {
        self.proposed_dates
            .iter()
            .find(|c| c.candidate_id == candidate_id)
    }

    /// Index of the single honored active token, after normalization.
    pub fn active_qr_index(&self) -> Option<usize> {
        self.qr_codes
            .iter()
            .position(|entry| entry.status == QrStatus::Active)
    }

    /// Whether an active, unexpired token exists at `now_ms`.
    pub fn has_live_token(&self, now_ms: u64) -> bool {
        self.qr_codes
            .iter()
            .any(|entry| entry.status == QrStatus::Active && entry.expires_at_ms >= now_ms)
    }

    pub fn qr_entry_by_code(&self, code: &str) -> Option<&QrCodeEntry> {
        self.qr_codes.iter().find(|entry| entry.code == code)
    }

    /// Reclassifies stale token entries. Two rules, both of which only
    /// tighten state and are therefore safe to apply on any read:
    ///
    /// - an `Active` entry past its deadline becomes `Expired`;
    /// - if several entries are flagged `Active` (which the generation
    ///   precondition should prevent), only the most recently generated one
    ///   is honored and the rest are forced `Expired`.
    ///
    /// Returns true if anything changed and the record is worth persisting.
    pub fn normalize_qr_codes(&mut self, now_ms: u64) -> bool {
        let mut changed = false;

        for entry in &mut self.qr_codes {
            if entry.status == QrStatus::Active && entry.expires_at_ms < now_ms {
                entry.status = QrStatus::Expired;
                changed = true;
            }
        }

        let newest_active = self
            .qr_codes
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == QrStatus::Active)
            .max_by_key(|(index, e)| (e.generated_at_ms, *index))
            .map(|(index, _)| index);
        if let Some(newest) = newest_active {
            for (index, entry) in self.qr_codes.iter_mut().enumerate() {
                if entry.status == QrStatus::Active && index != newest {
                    entry.status = QrStatus::Expired;
                    changed = true;
                }
            }
        }

        changed
    }
}
