// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared harness for the end-to-end tests: one in-memory deployment with a
//! controllable clock and a handful of seeded parties and offers.

use std::sync::Arc;

use chrono::NaiveDate;
use dhp_core::{
    manager::{context::memory::InMemoryContext, Manager, ManagerConfig},
    pickup::{
        DateProposal, OfferId, OfferSnapshot, OfferStatus, PartyId, PickupRecord, ReceiverKind,
    },
};
use dhp_token::{clock::ManualClock, TokenSigner};

// 2025-01-01T00:00:00Z
pub const START_MS: u64 = 1_735_689_600_000;

pub const SIGNING_KEY: &[u8] = b"integration-test-signing-key";

/// One donor, one NGO, one compost agency, and a manager wired over a single
/// in-memory context. The clock starts at [`START_MS`] and only moves when a
/// test advances it.
pub struct Deployment {
    pub manager: Manager<InMemoryContext>,
    pub context: InMemoryContext,
    pub clock: Arc<ManualClock>,
    pub donor: PartyId,
    pub ngo: PartyId,
    pub compost_agency: PartyId,
}

impl Deployment {
    pub fn new() -> Self {
        let context = InMemoryContext::new();
        let clock = Arc::new(ManualClock::new(START_MS));
        let manager = Manager::new(
            context.clone(),
            TokenSigner::new(SIGNING_KEY),
            clock.clone(),
            ManagerConfig::default(),
        );
        Self {
            manager,
            context,
            clock,
            donor: PartyId::random(),
            ngo: PartyId::random(),
            compost_agency: PartyId::random(),
        }
    }

    /// Seeds an accepted offer from the donor to `receiver` and returns its
    /// id, ready for `accept_offer`.
    pub fn seed_offer(
        &self,
        receiver: PartyId,
        receiver_kind: ReceiverKind,
        quantity: u32,
        tag: &str,
    ) -> OfferId {
        let offer_id = OfferId::random();
        self.context.add_offer(OfferSnapshot {
            id: offer_id,
            donor: self.donor,
            receiver,
            receiver_kind,
            quantity,
            tags: vec![tag.to_owned()],
            status: OfferStatus::Accepted,
        });
        offer_id
    }

    /// Walks a freshly seeded offer all the way to `Scheduled`: the receiver
    /// accepts and proposes `date`, the donor confirms it.
    pub async fn schedule_pickup(
        &self,
        receiver: PartyId,
        offer_id: OfferId,
        date: NaiveDate,
        time_slot: &str,
    ) -> anyhow::Result<PickupRecord> {
        let record = self.manager.accept_offer(receiver, offer_id).await?;
        let record = self
            .manager
            .propose_dates(
                receiver,
                record.id,
                vec![DateProposal {
                    date,
                    time_slot: time_slot.to_owned(),
                }],
            )
            .await?;
        let candidate = record.proposed_dates[0].candidate_id;
        Ok(self
            .manager
            .confirm_date(self.donor, record.id, candidate)
            .await?)
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}
