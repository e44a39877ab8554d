// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dhp_ledger::EarnReason;
use dhp_token::{clock::Clock, TokenSigner, PROOF_TOKEN_TTL_MS};
use uuid::Uuid;

use super::adapters::{
    EmailSink, LedgerStore, NotificationSink, OfferSource, PickupStore, ProofTokenCache,
};
use crate::{
    error::{Error, Result},
    event::PickupEvent,
    pickup::{
        CompletionDetails, DateProposal, OfferId, OfferStatus, PartyId, PickupId, PickupRecord,
        PickupState, QrCodeEntry, QrStatus, ReceiverKind,
    },
};

/// Tunables the embedding application supplies alongside the signing key.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Base points per donated unit when the receiver is an NGO.
    pub ngo_points_per_unit: u64,
    /// Base points per donated unit when the receiver is a compost agency.
    pub compost_points_per_unit: u64,
    /// Lifetime cap on token generation attempts per pickup.
    pub generation_attempt_cap: u8,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            ngo_points_per_unit: 10,
            compost_points_per_unit: 5,
            generation_attempt_cap: 3,
        }
    }
}

impl ManagerConfig {
    fn base_points(&self, kind: ReceiverKind, quantity: u32) -> u64 {
        let per_unit = match kind {
            ReceiverKind::Ngo => self.ngo_points_per_unit,
            ReceiverKind::CompostAgency => self.compost_points_per_unit,
        };
        per_unit.saturating_mul(u64::from(quantity))
    }
}

/// What a successful generation call returns, and the only place the encoded
/// token ever leaves the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedToken {
    pub token: String,
    pub expires_at_ms: u64,
}

/// Drives the pickup lifecycle against a context implementing the
/// [`super::adapters`] traits.
///
/// Every read-modify-write persists through a compare-and-swap on the record
/// version, so concurrent transitions on the same pickup cannot both land;
/// the loser gets a retryable [`Error::Conflict`]. Operations on different
/// pickups are fully independent.
pub struct Manager<E> {
    /// Context that implements adapters
    context: E,

    /// Mints and verifies proof tokens with the process-wide key.
    signer: TokenSigner,

    /// Injected time source; every expiry decision goes through it.
    clock: Arc<dyn Clock>,

    config: ManagerConfig,
}

impl<E> Manager<E> {
    /// Creates a new manager over `context`. All tokens minted by this
    /// manager are signed with `signer`'s key and dated by `clock`.
    pub fn new(
        context: E,
        signer: TokenSigner,
        clock: Arc<dyn Clock>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            context,
            signer,
            clock,
            config,
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn today(&self) -> Result<NaiveDate> {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms() as i64)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| Error::Validation {
                reason: "system clock is out of representable range".to_owned(),
            })
    }

    fn unauthorized(caller: PartyId, pickup_id: PickupId) -> Error {
        Error::Unauthorized {
            caller,
            subject: format!("pickup {pickup_id}"),
        }
    }
}

impl<E> Manager<E>
where
    E: NotificationSink + EmailSink,
{
    /// Best-effort fan-out. Sink failures are logged and never propagate:
    /// a completion whose follow-up email fails is still a completion.
    async fn emit(&self, event: PickupEvent) {
        for notification in event.notifications() {
            if let Err(err) = self.context.deliver_notification(notification).await {
                log::warn!("notification delivery failed: {err}");
            }
        }
        for email in event.emails() {
            if let Err(err) = self.context.deliver_email(email).await {
                log::warn!("email delivery failed: {err}");
            }
        }
    }
}

impl<E> Manager<E>
where
    E: PickupStore,
{
    async fn load(&self, pickup_id: PickupId) -> Result<PickupRecord> {
        self.context
            .pickup_by_id(pickup_id)
            .await
            .map_err(Error::adapter)?
            .ok_or_else(|| Error::NotFound {
                entity: "pickup",
                id: pickup_id.to_string(),
            })
    }

    /// Bumps the version and writes through the CAS. `Conflict` means a
    /// concurrent writer won; nothing was persisted.
    async fn persist(&self, mut record: PickupRecord) -> Result<PickupRecord> {
        let expected_version = record.version;
        record.version += 1;
        if self
            .context
            .update_pickup(record.clone(), expected_version)
            .await
            .map_err(Error::adapter)?
        {
            Ok(record)
        } else {
            Err(Error::Conflict {
                pickup_id: record.id,
            })
        }
    }

    /// Reads one pickup as a party sees it. Stale `Active` token entries are
    /// reclassified on the way out and the cleanup is persisted
    /// opportunistically; losing that write to a concurrent operation is
    /// harmless because normalization only tightens state.
    pub async fn pickup(&self, caller: PartyId, pickup_id: PickupId) -> Result<PickupRecord> {
        let mut record = self.load(pickup_id).await?;
        if !record.is_party(caller) {
            return Err(Self::unauthorized(caller, pickup_id));
        }

        let now_ms = self.now_ms();
        if record.normalize_qr_codes(now_ms) {
            match self.persist(record).await {
                Ok(updated) => record = updated,
                Err(Error::Conflict { .. }) => {
                    record = self.load(pickup_id).await?;
                    record.normalize_qr_codes(now_ms);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(record)
    }

    /// Low-frequency sweep that reclassifies expired-but-`Active` token
    /// entries. Idempotent and safe to run concurrently with anything else;
    /// records that move underneath it are caught by the next run. Returns
    /// how many records were cleaned up.
    pub async fn sweep_expired_tokens(&self) -> Result<usize> {
        let now_ms = self.now_ms();
        let ids = self
            .context
            .pickups_with_active_tokens()
            .await
            .map_err(Error::adapter)?;

        let mut reclassified = 0;
        for id in ids {
            let Some(mut record) = self
                .context
                .pickup_by_id(id)
                .await
                .map_err(Error::adapter)?
            else {
                continue;
            };
            if record.normalize_qr_codes(now_ms) {
                match self.persist(record).await {
                    Ok(_) => reclassified += 1,
                    Err(Error::Conflict { .. }) => {}
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(reclassified)
    }

    /// Administrative cleanup. Non-terminal pickups are never hard-deleted;
    /// only a completed record may be removed.
    pub async fn delete_completed(&self, caller: PartyId, pickup_id: PickupId) -> Result<()> {
        let record = self.load(pickup_id).await?;
        if !record.is_party(caller) {
            return Err(Self::unauthorized(caller, pickup_id));
        }
        if record.state != PickupState::Completed {
            return Err(Error::InvalidState {
                action: "deleting the record",
                state: record.state,
            });
        }
        self.context
            .delete_pickup(pickup_id)
            .await
            .map_err(Error::adapter)
    }
}

impl<E> Manager<E>
where
    E: OfferSource + PickupStore + LedgerStore + NotificationSink + EmailSink,
{
    /// Converts an accepted donation offer into a `Pending` pickup and
    /// credits the donor's base points (quantity times the receiver-kind
    /// multiplier). The receiver named on the offer must be the caller.
    ///
    /// Idempotent per offer: an offer spawns at most one pickup, so a
    /// resubmitted call returns the existing record without crediting the
    /// base points a second time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the offer no longer exists or is not in
    /// an acceptable state.
    pub async fn accept_offer(&self, caller: PartyId, offer_id: OfferId) -> Result<PickupRecord> {
        let offer = self
            .context
            .offer_by_id(offer_id)
            .await
            .map_err(Error::adapter)?
            .filter(|offer| offer.status == OfferStatus::Accepted)
            .ok_or_else(|| Error::NotFound {
                entity: "offer",
                id: offer_id.to_string(),
            })?;
        if caller != offer.receiver {
            return Err(Error::Unauthorized {
                caller,
                subject: format!("offer {offer_id}"),
            });
        }
        if offer.quantity == 0 {
            return Err(Error::Validation {
                reason: "offer quantity must be positive".to_owned(),
            });
        }

        if let Some(existing) = self
            .context
            .pickup_by_offer(offer_id)
            .await
            .map_err(Error::adapter)?
        {
            return Ok(existing);
        }

        let now_ms = self.now_ms();
        let record = PickupRecord::from_offer(&offer, now_ms);
        self.context
            .insert_pickup(record.clone())
            .await
            .map_err(Error::adapter)?;

        let base_points = self.config.base_points(offer.receiver_kind, offer.quantity);
        self.context
            .credit_points(
                offer.donor,
                offer.receiver,
                base_points,
                EarnReason::OfferAccepted,
                now_ms,
            )
            .await
            .map_err(Error::adapter)?;

        self.emit(PickupEvent::Created {
            pickup_id: record.id,
            donor: record.donor,
            quantity: record.quantity,
            base_points,
        })
        .await;
        Ok(record)
    }
}

impl<E> Manager<E>
where
    E: PickupStore + NotificationSink + EmailSink,
{
    /// Receiver submits 1–3 candidate `{date, time slot}` pairs, each date
    /// strictly in the future. Overwrites any prior proposal list. Allowed
    /// from `Pending` and `DatesProposed`.
    pub async fn propose_dates(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
        proposals: Vec<DateProposal>,
    ) -> Result<PickupRecord> {
        let record = self.load(pickup_id).await?;
        self.apply_proposals(record, caller, proposals, "proposing dates", false)
            .await
    }

    /// Same contract as [`Self::propose_dates`], but explicitly legal from
    /// `Scheduled`: the receiver walks back a confirmed commitment by
    /// proposing anew, which clears the confirmed date. A donor can never
    /// silently overwrite one via `confirm_date`.
    pub async fn re_propose_dates(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
        proposals: Vec<DateProposal>,
    ) -> Result<PickupRecord> {
        let record = self.load(pickup_id).await?;
        self.apply_proposals(record, caller, proposals, "re-proposing dates", true)
            .await
    }

    async fn apply_proposals(
        &self,
        mut record: PickupRecord,
        caller: PartyId,
        proposals: Vec<DateProposal>,
        action: &'static str,
        from_scheduled: bool,
    ) -> Result<PickupRecord> {
        if caller != record.receiver {
            return Err(Self::unauthorized(caller, record.id));
        }
        let allowed = if from_scheduled {
            record.state == PickupState::Scheduled
        } else {
            record.state.allows_proposal()
        };
        if !allowed {
            return Err(Error::InvalidState {
                action,
                state: record.state,
            });
        }

        if proposals.is_empty() || proposals.len() > 3 {
            return Err(Error::Validation {
                reason: format!("expected 1 to 3 date candidates, got {}", proposals.len()),
            });
        }
        let today = self.today()?;
        for proposal in &proposals {
            if proposal.date <= today {
                return Err(Error::Validation {
                    reason: format!("proposed date {} is not in the future", proposal.date),
                });
            }
            let slot = proposal.time_slot.trim();
            if slot.is_empty() || slot.len() > 64 {
                return Err(Error::Validation {
                    reason: "time slot must be 1 to 64 characters".to_owned(),
                });
            }
        }

        record.proposed_dates = proposals
            .into_iter()
            .map(crate::pickup::DateCandidate::from_proposal)
            .collect();
        record.confirmed_date = None;
        record.state = PickupState::DatesProposed;

        let record = self.persist(record).await?;
        self.emit(PickupEvent::DatesProposed {
            pickup_id: record.id,
            donor: record.donor,
            candidate_count: record.proposed_dates.len(),
        })
        .await;
        Ok(record)
    }

    /// Donor selects one stored candidate by its identity, never by
    /// re-parsing a date value, so timezone ambiguity cannot confirm the
    /// wrong slot. Re-confirming the already-confirmed candidate is a no-op;
    /// confirming a *different* one on a scheduled pickup is rejected (the
    /// receiver must re-propose first).
    pub async fn confirm_date(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
        candidate_id: Uuid,
    ) -> Result<PickupRecord> {
        let mut record = self.load(pickup_id).await?;
        if caller != record.donor {
            return Err(Self::unauthorized(caller, pickup_id));
        }
        match record.state {
            PickupState::DatesProposed => {}
            PickupState::Scheduled => {
                let already_confirmed = record
                    .confirmed_date
                    .as_ref()
                    .is_some_and(|c| c.candidate_id == candidate_id);
                if already_confirmed {
                    return Ok(record);
                }
                return Err(Error::InvalidState {
                    action: "confirming a different date",
                    state: record.state,
                });
            }
            state => {
                return Err(Error::InvalidState {
                    action: "confirming a date",
                    state,
                })
            }
        }

        let confirmed = record
            .candidate(candidate_id)
            .cloned()
            .ok_or_else(|| Error::Validation {
                reason: "selected date is not among the proposed candidates".to_owned(),
            })?;
        record.confirmed_date = Some(confirmed.clone());
        record.state = PickupState::Scheduled;

        let record = self.persist(record).await?;
        self.emit(PickupEvent::DateConfirmed {
            pickup_id: record.id,
            receiver: record.receiver,
            confirmed,
        })
        .await;
        Ok(record)
    }

    /// Receiver marks readiness to scan (`Scheduled → QrRequested`). Does not
    /// mint anything; minting is the donor's repeatable, capped operation.
    /// Re-requesting while already in `QrRequested` is a no-op.
    pub async fn request_proof_token(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
    ) -> Result<PickupRecord> {
        let mut record = self.load(pickup_id).await?;
        if caller != record.receiver {
            return Err(Self::unauthorized(caller, pickup_id));
        }
        let now_ms = self.now_ms();
        record.normalize_qr_codes(now_ms);
        match record.state {
            PickupState::QrRequested => return Ok(record),
            PickupState::Scheduled => {}
            state => {
                return Err(Error::InvalidState {
                    action: "requesting a proof token",
                    state,
                })
            }
        }
        if record.has_live_token(now_ms) {
            return Err(Error::Validation {
                reason: "an active proof token already exists for this pickup".to_owned(),
            });
        }

        record.state = PickupState::QrRequested;
        let record = self.persist(record).await?;
        self.emit(PickupEvent::ProofRequested {
            pickup_id: record.id,
            donor: record.donor,
        })
        .await;
        Ok(record)
    }

    /// Donor acknowledges the request (`QrRequested → QrAccepted`).
    /// Idempotent when already accepted.
    pub async fn accept_proof_request(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
    ) -> Result<PickupRecord> {
        let mut record = self.load(pickup_id).await?;
        if caller != record.donor {
            return Err(Self::unauthorized(caller, pickup_id));
        }
        match record.state {
            PickupState::QrAccepted => return Ok(record),
            PickupState::QrRequested => {}
            state => {
                return Err(Error::InvalidState {
                    action: "accepting the proof request",
                    state,
                })
            }
        }

        record.state = PickupState::QrAccepted;
        let record = self.persist(record).await?;
        self.emit(PickupEvent::ProofRequestAccepted {
            pickup_id: record.id,
            receiver: record.receiver,
        })
        .await;
        Ok(record)
    }

    /// Either party backs out, from any of the four cancellable states. The
    /// other party is told; the ledger is untouched.
    pub async fn cancel(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
        reason: Option<String>,
    ) -> Result<PickupRecord> {
        let mut record = self.load(pickup_id).await?;
        let other_party = record
            .other_party(caller)
            .ok_or_else(|| Self::unauthorized(caller, pickup_id))?;
        if !record.state.allows_cancellation() {
            return Err(Error::InvalidState {
                action: "cancelling",
                state: record.state,
            });
        }

        record.state = PickupState::Cancelled;
        let record = self.persist(record).await?;
        self.emit(PickupEvent::Cancelled {
            pickup_id: record.id,
            other_party,
            reason,
        })
        .await;
        Ok(record)
    }
}

impl<E> Manager<E>
where
    E: PickupStore + ProofTokenCache + NotificationSink + EmailSink,
{
    /// Donor mints a fresh proof token, at most
    /// [`ManagerConfig::generation_attempt_cap`] times over the pickup's
    /// lifetime. Requires a confirmed date and a state that allows
    /// completion. Any previously active entry is invalidated; the new token
    /// expires five minutes after issuance.
    ///
    /// The encoded token is returned only to this call. The receiver is
    /// notified that a token exists, never what it says.
    ///
    /// `idempotency_key` makes network retries safe: repeating the call with
    /// a key that still maps to a live token returns that token instead of
    /// burning another attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LimitExceeded`] once the cap is reached. That is
    /// terminal for this pickup's QR path; both parties are told support has
    /// to step in, and the pickup stays in its pre-completion state.
    pub async fn generate_proof_token(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
        idempotency_key: Option<&str>,
    ) -> Result<GeneratedToken> {
        let now_ms = self.now_ms();
        let mut record = self.load(pickup_id).await?;
        if caller != record.donor {
            return Err(Self::unauthorized(caller, pickup_id));
        }
        if !record.state.allows_completion() {
            return Err(Error::InvalidState {
                action: "generating a proof token",
                state: record.state,
            });
        }
        if record.confirmed_date.is_none() {
            return Err(Error::Validation {
                reason: "pickup has no confirmed date".to_owned(),
            });
        }

        if let Some(key) = idempotency_key {
            if let Some((token, expires_at_ms)) = self
                .context
                .recall_token(pickup_id, key, now_ms)
                .await
                .map_err(Error::adapter)?
            {
                return Ok(GeneratedToken {
                    token,
                    expires_at_ms,
                });
            }
        }

        let cap = self.config.generation_attempt_cap;
        if record.qr_generation_attempts >= cap {
            self.emit(PickupEvent::AttemptsExhausted {
                pickup_id,
                donor: record.donor,
                receiver: record.receiver,
            })
            .await;
            return Err(Error::LimitExceeded {
                attempts: record.qr_generation_attempts,
                cap,
            });
        }
        record.qr_generation_attempts += 1;

        record.normalize_qr_codes(now_ms);
        for entry in &mut record.qr_codes {
            if entry.status == QrStatus::Active {
                entry.status = QrStatus::Expired;
            }
        }

        let token = self
            .signer
            .issue(pickup_id.as_uuid(), now_ms)
            .map_err(Error::adapter)?;
        let expires_at_ms = now_ms + PROOF_TOKEN_TTL_MS;
        record.qr_codes.push(QrCodeEntry {
            code: token.encoded().to_owned(),
            generated_at_ms: now_ms,
            expires_at_ms,
            status: QrStatus::Active,
            scanned_at_ms: None,
            scanned_by: None,
        });

        // a lost CAS persists neither the token nor the attempt, so the
        // counter can never be under-counted
        let record = self.persist(record).await?;

        if let Some(key) = idempotency_key {
            self.context
                .remember_token(pickup_id, key, token.encoded().to_owned(), expires_at_ms)
                .await
                .map_err(Error::adapter)?;
        }

        self.emit(PickupEvent::ProofReady {
            pickup_id: record.id,
            receiver: record.receiver,
            expires_at_ms,
        })
        .await;
        Ok(GeneratedToken {
            token: token.into_encoded(),
            expires_at_ms,
        })
    }
}

impl<E> Manager<E>
where
    E: PickupStore + LedgerStore + NotificationSink + EmailSink,
{
    /// Receiver submits the scanned token to close out the pickup.
    ///
    /// Verification order is fixed: integrity, then pickup binding, then the
    /// five-minute window, then single-use status, each with its own error
    /// so the caller can message the user precisely ("expired" invites
    /// regeneration, "already used" does not). A failed verification never
    /// mutates the pickup.
    ///
    /// On success the consumed entry is marked used, the pickup completes,
    /// `additional_points` (if positive) are credited as a write separate
    /// from the acceptance-time base credit, and both parties are notified
    /// and emailed best-effort.
    pub async fn verify_and_complete(
        &self,
        caller: PartyId,
        pickup_id: PickupId,
        raw_token: &str,
        details: CompletionDetails,
    ) -> Result<PickupRecord> {
        let now_ms = self.now_ms();
        let mut record = self.load(pickup_id).await?;
        if caller != record.receiver {
            return Err(Self::unauthorized(caller, pickup_id));
        }
        if !record.state.allows_completion() {
            // a resubmitted consumed token answers "already used", never
            // "wrong state": the caller must not be invited to regenerate
            if let Some(entry) = record.qr_entry_by_code(raw_token) {
                if entry.status == QrStatus::Used {
                    return Err(Error::AlreadyUsed {
                        scanned_at_ms: entry.scanned_at_ms.unwrap_or(0),
                    });
                }
            }
            return Err(Error::InvalidState {
                action: "completing",
                state: record.state,
            });
        }

        // (a) integrity
        let payload = self.signer.verify(raw_token)?;
        // (b) binding to this pickup
        if payload.subject != pickup_id.as_uuid() {
            return Err(Error::Mismatch {
                expected: pickup_id,
                embedded: payload.subject,
            });
        }
        // (c) validity window
        if payload.is_expired(now_ms) {
            return Err(Error::ExpiredToken {
                age_ms: now_ms.saturating_sub(payload.issued_at_ms),
                window_ms: PROOF_TOKEN_TTL_MS,
            });
        }
        // (d) the matching entry must still be the honored active one
        record.normalize_qr_codes(now_ms);
        let index = record
            .qr_codes
            .iter()
            .position(|entry| entry.code == raw_token)
            .ok_or_else(|| Error::NotFound {
                entity: "proof token entry",
                id: pickup_id.to_string(),
            })?;
        match record.qr_codes[index].status {
            QrStatus::Active => {}
            QrStatus::Used => {
                return Err(Error::AlreadyUsed {
                    scanned_at_ms: record.qr_codes[index].scanned_at_ms.unwrap_or(0),
                })
            }
            // superseded by a more recent generation
            QrStatus::Expired => {
                return Err(Error::ExpiredToken {
                    age_ms: now_ms.saturating_sub(payload.issued_at_ms),
                    window_ms: PROOF_TOKEN_TTL_MS,
                })
            }
        }

        let entry = &mut record.qr_codes[index];
        entry.status = QrStatus::Used;
        entry.scanned_at_ms = Some(now_ms);
        entry.scanned_by = Some(caller);

        record.state = PickupState::Completed;
        record.completed_at_ms = Some(now_ms);
        record.completed_by = Some(caller);
        record.completion_notes = details.notes;
        record.additional_points = details.additional_points;

        // the CAS makes the mark-used + completion atomic with respect to a
        // concurrent verify of the same token: the loser re-reads a Used
        // entry and gets AlreadyUsed, never a second credit
        let record = self.persist(record).await?;

        if record.additional_points > 0 {
            self.context
                .credit_points(
                    record.donor,
                    record.receiver,
                    record.additional_points,
                    EarnReason::PickupCompleted,
                    now_ms,
                )
                .await
                .map_err(Error::adapter)?;
        }

        self.emit(PickupEvent::Completed {
            pickup_id: record.id,
            donor: record.donor,
            receiver: record.receiver,
            additional_points: record.additional_points,
        })
        .await;
        Ok(record)
    }
}

impl<E> Manager<E>
where
    E: LedgerStore,
{
    /// Redeems `amount` points from the donor's balance with `counterparty`.
    /// Returns the remaining pair balance.
    pub async fn redeem_points(
        &self,
        donor: PartyId,
        counterparty: PartyId,
        amount: u64,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(Error::Validation {
                reason: "redemption amount must be positive".to_owned(),
            });
        }
        let remaining = self
            .context
            .debit_points(donor, counterparty, amount, self.now_ms())
            .await
            .map_err(Error::adapter)??;
        Ok(remaining)
    }

    /// Donor's aggregate balance across all counterparties. Pure read.
    pub async fn balance(&self, donor: PartyId) -> Result<u64> {
        self.context
            .donor_balance(donor)
            .await
            .map_err(Error::adapter)
    }

    /// Donor's balance with one counterparty. Pure read.
    pub async fn pair_balance(&self, donor: PartyId, counterparty: PartyId) -> Result<u64> {
        self.context
            .pair_balance(donor, counterparty)
            .await
            .map_err(Error::adapter)
    }
}
