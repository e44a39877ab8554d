// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory context implementation for the handoff manager.
//!
//! This module provides an in-memory implementation of every manager adapter.
//! It is useful for testing and development purposes: storages are plain maps
//! behind `RwLock`s, deliveries are recorded instead of sent, and the sinks
//! can be flipped into a failing mode to exercise the best-effort contract.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use async_trait::async_trait;
use dhp_ledger::{EarnReason, LedgerError, PointsLedger};
use dhp_token::store::ExpiringStore;
use thiserror::Error;

use crate::{
    event::{Email, Notification},
    manager::adapters::{
        EmailSink, LedgerStore, NotificationSink, OfferSource, PickupStore, ProofTokenCache,
    },
    pickup::{OfferId, OfferSnapshot, PartyId, PickupId, PickupRecord, QrStatus},
};

pub type PickupStorage = Arc<RwLock<HashMap<PickupId, PickupRecord>>>;
pub type OfferStorage = Arc<RwLock<HashMap<OfferId, OfferSnapshot>>>;
pub type LedgerStorage = Arc<RwLock<PointsLedger<PartyId>>>;
pub type TokenCacheStorage = Arc<RwLock<ExpiringStore<(PickupId, String), (String, u64)>>>;
pub type SentNotifications = Arc<RwLock<Vec<Notification>>>;
pub type SentEmails = Arc<RwLock<Vec<Email>>>;

#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("something went wrong: {error}")]
    AdapterError { error: String },
}

/// Every adapter the manager needs, backed by in-process shared state that
/// tests can also read and seed directly.
#[derive(Clone, Default)]
pub struct InMemoryContext {
    pickup_storage: PickupStorage,
    offer_storage: OfferStorage,
    ledger_storage: LedgerStorage,
    token_cache: TokenCacheStorage,
    sent_notifications: SentNotifications,
    sent_emails: SentEmails,
    /// When set, both sinks fail every delivery. The manager must shrug.
    failing_sinks: Arc<AtomicBool>,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an offer for [`crate::manager::Manager::accept_offer`] to find.
    pub fn add_offer(&self, offer: OfferSnapshot) {
        self.offer_storage
            .write()
            .unwrap()
            .insert(offer.id, offer);
    }

    pub fn ledger(&self) -> LedgerStorage {
        self.ledger_storage.clone()
    }

    pub fn sent_notifications(&self) -> Vec<Notification> {
        self.sent_notifications.read().unwrap().clone()
    }

    pub fn sent_emails(&self) -> Vec<Email> {
        self.sent_emails.read().unwrap().clone()
    }

    /// Makes every subsequent delivery fail, for exercising the best-effort
    /// sink contract.
    pub fn set_failing_sinks(&self, failing: bool) {
        self.failing_sinks.store(failing, Ordering::SeqCst);
    }

    /// Direct read of a stored record, bypassing the manager. Test helper.
    pub fn stored_pickup(&self, id: PickupId) -> Option<PickupRecord> {
        self.pickup_storage.read().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl PickupStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn insert_pickup(&self, record: PickupRecord) -> Result<(), Self::AdapterError> {
        let mut storage = self.pickup_storage.write().unwrap();
        if storage.contains_key(&record.id) {
            return Err(InMemoryError::AdapterError {
                error: format!("pickup {} already exists", record.id),
            });
        }
        storage.insert(record.id, record);
        Ok(())
    }

    async fn pickup_by_id(
        &self,
        id: PickupId,
    ) -> Result<Option<PickupRecord>, Self::AdapterError> {
        Ok(self.pickup_storage.read().unwrap().get(&id).cloned())
    }

    async fn pickup_by_offer(
        &self,
        offer_id: OfferId,
    ) -> Result<Option<PickupRecord>, Self::AdapterError> {
        Ok(self
            .pickup_storage
            .read()
            .unwrap()
            .values()
            .find(|record| record.offer_id == offer_id)
            .cloned())
    }

    async fn update_pickup(
        &self,
        record: PickupRecord,
        expected_version: u64,
    ) -> Result<bool, Self::AdapterError> {
        let mut storage = self.pickup_storage.write().unwrap();
        match storage.get(&record.id) {
            Some(existing) if existing.version == expected_version => {
                storage.insert(record.id, record);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(InMemoryError::AdapterError {
                error: format!("pickup {} does not exist", record.id),
            }),
        }
    }

    async fn delete_pickup(&self, id: PickupId) -> Result<(), Self::AdapterError> {
        self.pickup_storage
            .write()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| InMemoryError::AdapterError {
                error: format!("pickup {id} does not exist"),
            })
    }

    async fn pickups_with_active_tokens(&self) -> Result<Vec<PickupId>, Self::AdapterError> {
        Ok(self
            .pickup_storage
            .read()
            .unwrap()
            .values()
            .filter(|record| {
                record
                    .qr_codes
                    .iter()
                    .any(|entry| entry.status == QrStatus::Active)
            })
            .map(|record| record.id)
            .collect())
    }
}

#[async_trait]
impl OfferSource for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn offer_by_id(
        &self,
        id: OfferId,
    ) -> Result<Option<OfferSnapshot>, Self::AdapterError> {
        Ok(self.offer_storage.read().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl LedgerStore for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn credit_points(
        &self,
        donor: PartyId,
        counterparty: PartyId,
        amount: u64,
        reason: EarnReason,
        at_ms: u64,
    ) -> Result<u64, Self::AdapterError> {
        self.ledger_storage
            .write()
            .unwrap()
            .credit(donor, counterparty, amount, reason, at_ms)
            .map_err(|err| InMemoryError::AdapterError {
                error: err.to_string(),
            })
    }

    async fn debit_points(
        &self,
        donor: PartyId,
        counterparty: PartyId,
        amount: u64,
        at_ms: u64,
    ) -> Result<Result<u64, LedgerError>, Self::AdapterError> {
        Ok(self
            .ledger_storage
            .write()
            .unwrap()
            .debit(donor, counterparty, amount, at_ms))
    }

    async fn donor_balance(&self, donor: PartyId) -> Result<u64, Self::AdapterError> {
        Ok(self.ledger_storage.read().unwrap().balance(&donor))
    }

    async fn pair_balance(
        &self,
        donor: PartyId,
        counterparty: PartyId,
    ) -> Result<u64, Self::AdapterError> {
        Ok(self
            .ledger_storage
            .read()
            .unwrap()
            .pair_balance(&donor, &counterparty))
    }
}

#[async_trait]
impl ProofTokenCache for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn recall_token(
        &self,
        pickup: PickupId,
        key: &str,
        now_ms: u64,
    ) -> Result<Option<(String, u64)>, Self::AdapterError> {
        Ok(self
            .token_cache
            .read()
            .unwrap()
            .get(&(pickup, key.to_owned()), now_ms)
            .cloned())
    }

    async fn remember_token(
        &self,
        pickup: PickupId,
        key: &str,
        token: String,
        expires_at_ms: u64,
    ) -> Result<(), Self::AdapterError> {
        self.token_cache.write().unwrap().insert(
            (pickup, key.to_owned()),
            (token, expires_at_ms),
            expires_at_ms,
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn deliver_notification(
        &self,
        notification: Notification,
    ) -> Result<(), Self::AdapterError> {
        if self.failing_sinks.load(Ordering::SeqCst) {
            return Err(InMemoryError::AdapterError {
                error: "notification channel is down".to_owned(),
            });
        }
        self.sent_notifications.write().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl EmailSink for InMemoryContext {
    type AdapterError = InMemoryError;

    async fn deliver_email(&self, email: Email) -> Result<(), Self::AdapterError> {
        if self.failing_sinks.load(Ordering::SeqCst) {
            return Err(InMemoryError::AdapterError {
                error: "smtp relay is down".to_owned(),
            });
        }
        self.sent_emails.write().unwrap().push(email);
        Ok(())
    }
}
