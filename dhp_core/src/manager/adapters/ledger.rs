// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use dhp_ledger::{EarnReason, LedgerError};

use crate::pickup::PartyId;

/// Access to the points ledger.
///
/// Implementations must serialize mutations at per-donor granularity: a donor
/// whose pickups complete concurrently across several receivers still touches
/// one ledger document, and a lost update there is a lost credit.
#[async_trait]
pub trait LedgerStore {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library. Errors of this type are returned to the user
    /// when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// Credits `amount` (always > 0, the manager validates) to the
    /// `(donor, counterparty)` pair. Returns the new pair balance.
    async fn credit_points(
        &self,
        donor: PartyId,
        counterparty: PartyId,
        amount: u64,
        reason: EarnReason,
        at_ms: u64,
    ) -> Result<u64, Self::AdapterError>;

    /// Debits `amount` from the pair. The outer error is a storage failure;
    /// the inner one is a domain rejection (insufficient points) that the
    /// manager forwards to the caller unchanged.
    async fn debit_points(
        &self,
        donor: PartyId,
        counterparty: PartyId,
        amount: u64,
        at_ms: u64,
    ) -> Result<Result<u64, LedgerError>, Self::AdapterError>;

    /// Aggregate balance for a donor across all counterparties.
    async fn donor_balance(&self, donor: PartyId) -> Result<u64, Self::AdapterError>;

    /// Balance for one `(donor, counterparty)` pair.
    async fn pair_balance(
        &self,
        donor: PartyId,
        counterparty: PartyId,
    ) -> Result<u64, Self::AdapterError>;
}
