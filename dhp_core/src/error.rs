// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the handoff core.
//!
//! Every rejected transition carries a specific reason so the caller can
//! message the user precisely: an expired token prompts regeneration, a used
//! one does not, a conflict invites a retry.

use uuid::Uuid;

use crate::pickup::{PartyId, PickupId, PickupState};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input; the caller must correct and resubmit.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// A referenced entity is absent (or, for offers, not in an acceptable
    /// state).
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Lost a concurrent read-modify-write race on this pickup. Safe to retry.
    #[error("pickup {pickup_id} was updated concurrently, retry the operation")]
    Conflict { pickup_id: PickupId },

    /// The state machine does not permit this transition from the current
    /// state ("not your turn").
    #[error("{action} is not allowed while the pickup is {state}")]
    InvalidState {
        action: &'static str,
        state: PickupState,
    },

    /// The caller is not a party to the pickup, or is the wrong party for
    /// this transition.
    #[error("party {caller} may not perform this action on {subject}")]
    Unauthorized { caller: PartyId, subject: String },

    /// The submitted token failed structural or integrity verification.
    #[error(transparent)]
    InvalidToken(#[from] dhp_token::TokenError),

    /// The token's validity window has elapsed; the donor may regenerate.
    #[error("proof token expired: issued {age_ms} ms ago, window is {window_ms} ms")]
    ExpiredToken { age_ms: u64, window_ms: u64 },

    /// The token was minted for a different pickup than the one targeted.
    #[error("proof token was minted for pickup {embedded}, not {expected}")]
    Mismatch { expected: PickupId, embedded: Uuid },

    /// The token was already consumed; completion happened and will not
    /// credit twice.
    #[error("proof token was already used at {scanned_at_ms}")]
    AlreadyUsed { scanned_at_ms: u64 },

    /// Generation attempt cap reached. Terminal for this pickup's QR path;
    /// requires manual intervention.
    #[error("token generation attempts exhausted ({attempts} of {cap})")]
    LimitExceeded { attempts: u8, cap: u8 },

    /// Ledger rejection, including insufficient points at redemption.
    #[error(transparent)]
    Ledger(#[from] dhp_ledger::LedgerError),

    /// Error from an adapter the context implements.
    #[error("error from adapter: {source_error}")]
    Adapter { source_error: anyhow::Error },
}

impl Error {
    /// Wraps an adapter-originated failure, preserving its chain.
    pub fn adapter<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Adapter {
            source_error: anyhow::Error::new(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
