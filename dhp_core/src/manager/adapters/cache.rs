// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::pickup::PickupId;

/// Short-lived memory of recently minted tokens, keyed by a caller-supplied
/// idempotency key.
///
/// Token generation is the one mutation where a blind network retry costs
/// something (an attempt out of the cap of three), so a donor client may tag
/// the call with a key; retrying with the same key returns the same token
/// instead of burning another attempt. Entries live no longer than the token
/// they remember. See [`dhp_token::store::ExpiringStore`] for the reference
/// backing structure.
#[async_trait]
pub trait ProofTokenCache {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library. Errors of this type are returned to the user
    /// when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// The token remembered under `(pickup, key)` if it is still live at
    /// `now_ms`, together with its expiry deadline.
    async fn recall_token(
        &self,
        pickup: PickupId,
        key: &str,
        now_ms: u64,
    ) -> Result<Option<(String, u64)>, Self::AdapterError>;

    /// Remembers `token` under `(pickup, key)` until `expires_at_ms`.
    async fn remember_token(
        &self,
        pickup: PickupId,
        key: &str,
        token: String,
        expires_at_ms: u64,
    ) -> Result<(), Self::AdapterError>;
}
