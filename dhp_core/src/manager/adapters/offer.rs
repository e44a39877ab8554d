// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::pickup::{OfferId, OfferSnapshot};

/// Read-only view of the upstream donation-offer collaborator.
///
/// The core consumes an offer's id, parties, quantity and classification tags
/// exactly once, when acceptance spawns a pickup.
#[async_trait]
pub trait OfferSource {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library. Errors of this type are returned to the user
    /// when an operation fails.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    /// The offer as the collaborator currently sees it, `None` if it no
    /// longer exists. Status filtering is the manager's job.
    async fn offer_by_id(&self, id: OfferId) -> Result<Option<OfferSnapshot>, Self::AdapterError>;
}
