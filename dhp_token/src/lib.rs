// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Proof-of-pickup tokens
//!
//! This crate contains the [`TokenSigner`] which mints and verifies the
//! short-lived proof tokens exchanged at a donation hand-off. A donor asks the
//! system for a fresh token, shows it to the receiver (as a QR code in the
//! current application), and the receiver submits it back to close the pickup.
//! The token is MAC'd with a process-wide key so neither party can forge or
//! alter one, and it carries its own issuance timestamp so expiry is a pure
//! function of the verification-time clock.
//!
//! # Example
//! ```rust
//! use dhp_token::{clock::{Clock, SystemClock}, TokenSigner};
//! # use uuid::Uuid;
//!
//! let signer = TokenSigner::new(b"process-wide-secret");
//! let clock = SystemClock;
//!
//! let token = signer.issue(Uuid::new_v4(), clock.now_ms()).unwrap();
//! let payload = signer.verify(token.encoded()).unwrap();
//!
//! assert_eq!(payload.subject, token.payload().subject);
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

pub mod clock;
pub mod store;

type HmacSha256 = Hmac<Sha256>;

/// Validity window of a proof token, measured from issuance.
pub const PROOF_TOKEN_TTL_MS: u64 = 5 * 60 * 1000;

/// Errors returned by minting and verifying proof tokens
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    /// The token does not have the `payload.mac` wire shape, or one of the
    /// two parts fails to decode.
    #[error("malformed token: {reason}")]
    Malformed { reason: String },

    /// The MAC does not match the payload. Deliberately carries no detail.
    #[error("token failed integrity check")]
    BadSignature,

    #[error("signing key rejected by MAC implementation")]
    KeyRejected,

    #[error("failed to encode token payload: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The authenticated content of a proof token.
///
/// `subject` is the id of the pickup the token was minted for; a token
/// presented against any other pickup must be rejected by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPayload {
    pub subject: Uuid,
    pub nonce: [u8; 16],
    pub issued_at_ms: u64,
}

impl ProofPayload {
    /// Whether the validity window has elapsed at `now_ms`.
    ///
    /// A clock that went backwards makes the token look freshly issued, which
    /// only ever shortens-then-restores the window; it never extends it.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.issued_at_ms) > PROOF_TOKEN_TTL_MS
    }

    /// Instant after which [`Self::is_expired`] starts returning true.
    pub fn expires_at_ms(&self) -> u64 {
        self.issued_at_ms.saturating_add(PROOF_TOKEN_TTL_MS)
    }
}

/// A freshly minted token: the payload plus its encoded wire form.
///
/// The encoded form is what gets rendered as a QR code. It is returned only to
/// the minting call and must never travel over a side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedProofToken {
    payload: ProofPayload,
    encoded: String,
}

impl SignedProofToken {
    pub fn payload(&self) -> &ProofPayload {
        &self.payload
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn into_encoded(self) -> String {
        self.encoded
    }
}

/// Mints and verifies proof tokens with a process-wide HMAC-SHA256 key.
///
/// The key is configuration, not entity state: every token in the process is
/// signed with the same key, and rotating it invalidates all outstanding
/// tokens (acceptable, given the 5-minute window).
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::KeyRejected)
    }

    /// Mints a token bound to `subject`, issued at `now_ms`, with a random
    /// nonce so two tokens for the same pickup in the same millisecond still
    /// differ.
    pub fn issue(&self, subject: Uuid, now_ms: u64) -> Result<SignedProofToken, TokenError> {
        let payload = ProofPayload {
            subject,
            nonce: rand::rng().random(),
            issued_at_ms: now_ms,
        };
        let bytes = serde_json::to_vec(&payload)?;

        let mut mac = self.mac()?;
        mac.update(&bytes);
        let tag = mac.finalize().into_bytes();

        let encoded = format!("{}.{}", URL_SAFE_NO_PAD.encode(&bytes), hex::encode(tag));
        Ok(SignedProofToken { payload, encoded })
    }

    /// Verifies integrity of an encoded token and returns its payload.
    ///
    /// Only structure and the MAC are checked here; binding to a particular
    /// pickup and the expiry window are the caller's checks, because they need
    /// the caller's notion of "which pickup" and "what time it is".
    pub fn verify(&self, encoded: &str) -> Result<ProofPayload, TokenError> {
        let (payload_part, tag_part) = encoded.split_once('.').ok_or(TokenError::Malformed {
            reason: "expected payload.mac".to_owned(),
        })?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|e| TokenError::Malformed {
                reason: e.to_string(),
            })?;
        let tag = hex::decode(tag_part).map_err(|e| TokenError::Malformed {
            reason: e.to_string(),
        })?;

        let mut mac = self.mac()?;
        mac.update(&bytes);
        // constant-time comparison
        mac.verify_slice(&tag).map_err(|_| TokenError::BadSignature)?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;
    use uuid::Uuid;

    use super::*;

    #[fixture]
    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret")
    }

    #[rstest]
    fn issue_then_verify_roundtrip(signer: TokenSigner) {
        let subject = Uuid::new_v4();
        let token = signer.issue(subject, 1_000).unwrap();

        let payload = signer.verify(token.encoded()).unwrap();
        assert_eq!(payload.subject, subject);
        assert_eq!(payload.issued_at_ms, 1_000);
    }

    #[rstest]
    fn tampered_payload_is_rejected(signer: TokenSigner) {
        let token = signer.issue(Uuid::new_v4(), 1_000).unwrap();
        let (payload_part, tag_part) = token.encoded().split_once('.').unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(payload_part).unwrap();
        let json = String::from_utf8(bytes.clone()).unwrap();
        let forged = json.replace("\"issued_at_ms\":1000", "\"issued_at_ms\":9000");
        bytes = forged.into_bytes();

        let reforged = format!("{}.{}", URL_SAFE_NO_PAD.encode(&bytes), tag_part);
        assert!(matches!(
            signer.verify(&reforged),
            Err(TokenError::BadSignature)
        ));
    }

    #[rstest]
    fn wrong_key_is_rejected(signer: TokenSigner) {
        let token = signer.issue(Uuid::new_v4(), 1_000).unwrap();
        let other = TokenSigner::new(b"another-secret");
        assert!(matches!(
            other.verify(token.encoded()),
            Err(TokenError::BadSignature)
        ));
    }

    #[rstest]
    #[case::no_separator("not-a-token")]
    #[case::bad_base64("@@@.abcdef")]
    #[case::bad_hex("YQ.zzzz")]
    fn malformed_tokens_are_rejected(signer: TokenSigner, #[case] encoded: &str) {
        assert!(matches!(
            signer.verify(encoded),
            Err(TokenError::Malformed { .. })
        ));
    }

    #[rstest]
    fn expiry_is_a_pure_function_of_the_clock(signer: TokenSigner) {
        let token = signer.issue(Uuid::new_v4(), 10_000).unwrap();
        let payload = token.payload();

        assert!(!payload.is_expired(10_000));
        assert!(!payload.is_expired(10_000 + PROOF_TOKEN_TTL_MS));
        assert!(payload.is_expired(10_000 + PROOF_TOKEN_TTL_MS + 1));
        // clock went backwards
        assert!(!payload.is_expired(0));
    }

    #[rstest]
    fn nonce_makes_same_millisecond_tokens_distinct(signer: TokenSigner) {
        let subject = Uuid::new_v4();
        let a = signer.issue(subject, 1_000).unwrap();
        let b = signer.issue(subject, 1_000).unwrap();
        assert_ne!(a.encoded(), b.encoded());
    }
}
