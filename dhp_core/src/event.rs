// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Lifecycle events and their outbound payloads
//!
//! Every side effect a transition produces is described by one
//! [`PickupEvent`] variant. The notification and email collaborators consume
//! the closed set through [`PickupEvent::notifications`] and
//! [`PickupEvent::emails`]; there is no ad hoc field bag to misaddress.
//!
//! Delivery is best-effort: the manager logs sink failures and never fails
//! the primary operation over them.

use serde::{Deserialize, Serialize};

use crate::pickup::{DateCandidate, PartyId, PickupId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationCategory {
    Pickup,
    Points,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationPriority {
    Normal,
    High,
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub target: PartyId,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub link: Option<String>,
}

/// Payload handed to the email collaborator. Resolving the party to a mailbox
/// address is the collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub recipient: PartyId,
    pub subject: String,
    pub body: String,
}

/// The closed set of things that can happen to a pickup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupEvent {
    /// An accepted offer spawned a pickup.
    Created {
        pickup_id: PickupId,
        donor: PartyId,
        quantity: u32,
        base_points: u64,
    },
    /// The receiver submitted (or replaced) the candidate date list.
    DatesProposed {
        pickup_id: PickupId,
        donor: PartyId,
        candidate_count: usize,
    },
    /// The donor confirmed one candidate.
    DateConfirmed {
        pickup_id: PickupId,
        receiver: PartyId,
        confirmed: DateCandidate,
    },
    /// The receiver asked for a proof token to be made available.
    ProofRequested {
        pickup_id: PickupId,
        donor: PartyId,
    },
    /// The donor acknowledged the request.
    ProofRequestAccepted {
        pickup_id: PickupId,
        receiver: PartyId,
    },
    /// A token was minted. The token itself never rides on this event; only
    /// the donor's generation call returns it.
    ProofReady {
        pickup_id: PickupId,
        receiver: PartyId,
        expires_at_ms: u64,
    },
    /// The hand-off was verified and the pickup completed.
    Completed {
        pickup_id: PickupId,
        donor: PartyId,
        receiver: PartyId,
        additional_points: u64,
    },
    /// One party cancelled; the other is told.
    Cancelled {
        pickup_id: PickupId,
        other_party: PartyId,
        reason: Option<String>,
    },
    /// The QR generation cap was hit without a completion. Both parties need
    /// to hear that support has to step in.
    AttemptsExhausted {
        pickup_id: PickupId,
        donor: PartyId,
        receiver: PartyId,
    },
}

impl PickupEvent {
    fn link(pickup_id: &PickupId) -> Option<String> {
        Some(format!("/pickups/{pickup_id}"))
    }

    /// Notifications this event fans out to.
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            PickupEvent::Created {
                pickup_id,
                donor,
                quantity,
                base_points,
            } => vec![Notification {
                title: "Donation accepted".to_owned(),
                message: format!(
                    "Your donation ({quantity} units) was accepted and a pickup was created. \
                     You earned {base_points} points."
                ),
                target: *donor,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::Normal,
                link: Self::link(pickup_id),
            }],
            PickupEvent::DatesProposed {
                pickup_id,
                donor,
                candidate_count,
            } => vec![Notification {
                title: "Pickup dates proposed".to_owned(),
                message: format!(
                    "The receiver proposed {candidate_count} pickup date(s). Please confirm one."
                ),
                target: *donor,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::Normal,
                link: Self::link(pickup_id),
            }],
            PickupEvent::DateConfirmed {
                pickup_id,
                receiver,
                confirmed,
            } => vec![Notification {
                title: "Pickup scheduled".to_owned(),
                message: format!(
                    "The donor confirmed {} at {}.",
                    confirmed.date, confirmed.time_slot
                ),
                target: *receiver,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::Normal,
                link: Self::link(pickup_id),
            }],
            PickupEvent::ProofRequested { pickup_id, donor } => vec![Notification {
                title: "Proof of pickup requested".to_owned(),
                message: "The receiver is ready to scan. Generate a QR code when you meet."
                    .to_owned(),
                target: *donor,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::Normal,
                link: Self::link(pickup_id),
            }],
            PickupEvent::ProofRequestAccepted {
                pickup_id,
                receiver,
            } => vec![Notification {
                title: "Proof request accepted".to_owned(),
                message: "The donor acknowledged your request.".to_owned(),
                target: *receiver,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::Normal,
                link: Self::link(pickup_id),
            }],
            PickupEvent::ProofReady {
                pickup_id,
                receiver,
                expires_at_ms,
            } => vec![Notification {
                title: "QR code ready".to_owned(),
                message: format!(
                    "The donor generated a QR code. Scan it before it expires (deadline \
                     {expires_at_ms})."
                ),
                target: *receiver,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::High,
                link: Self::link(pickup_id),
            }],
            PickupEvent::Completed {
                pickup_id,
                donor,
                receiver,
                additional_points,
            } => vec![
                Notification {
                    title: "Pickup completed".to_owned(),
                    message: if *additional_points > 0 {
                        format!("Pickup verified. You earned {additional_points} bonus points.")
                    } else {
                        "Pickup verified. Thank you for donating!".to_owned()
                    },
                    target: *donor,
                    category: NotificationCategory::Points,
                    priority: NotificationPriority::Normal,
                    link: Self::link(pickup_id),
                },
                Notification {
                    title: "Pickup completed".to_owned(),
                    message: "The hand-off was verified and recorded.".to_owned(),
                    target: *receiver,
                    category: NotificationCategory::Pickup,
                    priority: NotificationPriority::Normal,
                    link: Self::link(pickup_id),
                },
            ],
            PickupEvent::Cancelled {
                pickup_id,
                other_party,
                reason,
            } => vec![Notification {
                title: "Pickup cancelled".to_owned(),
                message: match reason {
                    Some(reason) => format!("The pickup was cancelled: {reason}"),
                    None => "The pickup was cancelled.".to_owned(),
                },
                target: *other_party,
                category: NotificationCategory::Pickup,
                priority: NotificationPriority::High,
                link: Self::link(pickup_id),
            }],
            PickupEvent::AttemptsExhausted {
                pickup_id,
                donor,
                receiver,
            } => [donor, receiver]
                .into_iter()
                .map(|target| Notification {
                    title: "QR verification needs support".to_owned(),
                    message: "All QR generation attempts were used without a completed scan. \
                              Please contact support to close out this pickup."
                        .to_owned(),
                    target: *target,
                    category: NotificationCategory::Support,
                    priority: NotificationPriority::High,
                    link: Self::link(pickup_id),
                })
                .collect(),
        }
    }

    /// Emails this event fans out to. Only completion is mailed; everything
    /// else stays in-app.
    pub fn emails(&self) -> Vec<Email> {
        match self {
            PickupEvent::Completed {
                pickup_id,
                donor,
                receiver,
                additional_points,
            } => vec![
                Email {
                    recipient: *donor,
                    subject: "Your donation pickup is complete".to_owned(),
                    body: format!(
                        "Pickup {pickup_id} was verified at hand-off.{}",
                        if *additional_points > 0 {
                            format!(" {additional_points} bonus points were added to your balance.")
                        } else {
                            String::new()
                        }
                    ),
                },
                Email {
                    recipient: *receiver,
                    subject: "Pickup recorded".to_owned(),
                    body: format!("Pickup {pickup_id} was verified and recorded."),
                },
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_notifies_and_mails_both_parties() {
        let event = PickupEvent::Completed {
            pickup_id: PickupId::random(),
            donor: PartyId::random(),
            receiver: PartyId::random(),
            additional_points: 20,
        };

        let notifications = event.notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(event.emails().len(), 2);
        assert!(notifications[0].message.contains("20 bonus points"));
    }

    #[test]
    fn cancellation_targets_only_the_other_party() {
        let other_party = PartyId::random();
        let event = PickupEvent::Cancelled {
            pickup_id: PickupId::random(),
            other_party,
            reason: Some("moved house".to_owned()),
        };

        let notifications = event.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].target, other_party);
        assert!(notifications[0].message.contains("moved house"));
        assert!(event.emails().is_empty());
    }

    #[test]
    fn exhausted_attempts_reach_both_parties_at_high_priority() {
        let event = PickupEvent::AttemptsExhausted {
            pickup_id: PickupId::random(),
            donor: PartyId::random(),
            receiver: PartyId::random(),
        };

        let notifications = event.notifications();
        assert_eq!(notifications.len(), 2);
        assert!(notifications
            .iter()
            .all(|n| n.priority == NotificationPriority::High));
    }

    #[test]
    fn proof_ready_never_carries_the_token() {
        let event = PickupEvent::ProofReady {
            pickup_id: PickupId::random(),
            receiver: PartyId::random(),
            expires_at_ms: 300_000,
        };
        // the variant has no field for the encoded token, and the message
        // only mentions the deadline
        let notifications = event.notifications();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("300000"));
    }
}
