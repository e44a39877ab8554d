// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::pickup::{OfferId, PickupId, PickupRecord};

/// Stores pickup records.
///
/// Updates go through a compare-and-swap on the record version so two
/// concurrent read-modify-writes on the same pickup cannot both land; the
/// loser gets told and surfaces a retryable conflict to its caller.
#[async_trait]
pub trait PickupStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library. Errors of this type are returned to the user
    /// when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Stores a freshly created record. The id must not already exist.
    async fn insert_pickup(&self, record: PickupRecord) -> Result<(), Self::AdapterError>;

    async fn pickup_by_id(&self, id: PickupId)
        -> Result<Option<PickupRecord>, Self::AdapterError>;

    /// The pickup spawned by `offer_id`, if one exists. An offer spawns at
    /// most one pickup, ever.
    async fn pickup_by_offer(
        &self,
        offer_id: OfferId,
    ) -> Result<Option<PickupRecord>, Self::AdapterError>;

    /// Replaces the stored record only if its current version equals
    /// `expected_version`. Returns false when the version moved underneath
    /// the caller.
    async fn update_pickup(
        &self,
        record: PickupRecord,
        expected_version: u64,
    ) -> Result<bool, Self::AdapterError>;

    /// Removes a record. The manager only calls this for completed pickups
    /// (administrative cleanup); non-terminal records are never hard-deleted.
    async fn delete_pickup(&self, id: PickupId) -> Result<(), Self::AdapterError>;

    /// Ids of every record that still carries an `Active` token entry. Feeds
    /// the expiry sweep.
    async fn pickups_with_active_tokens(&self) -> Result<Vec<PickupId>, Self::AdapterError>;
}
