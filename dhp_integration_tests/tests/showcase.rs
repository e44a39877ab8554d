// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

// These tests walk whole pickups through a single in-memory deployment: a
// donor hands surplus goods to an NGO or a compost agency, the parties agree
// on a date, and the hand-off is proven with a short-lived QR token before
// any points move.

use chrono::NaiveDate;
use dhp_core::{
    pickup::{CompletionDetails, PickupState, QrStatus, ReceiverKind},
    Error,
};
use dhp_integration_tests::Deployment;
use dhp_ledger::LedgerError;
use rstest::*;

const MINUTE_MS: u64 = 60 * 1000;

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

#[tokio::test]
async fn a_donation_travels_from_accepted_offer_to_verified_completion() -> anyhow::Result<()> {
    let deployment = Deployment::new();
    let offer_id = deployment.seed_offer(deployment.ngo, ReceiverKind::Ngo, 5, "food");

    let record = deployment
        .schedule_pickup(deployment.ngo, offer_id, march(1), "10:00 AM")
        .await?;
    assert_eq!(record.state, PickupState::Scheduled);

    // base credit landed at acceptance: 5 units at 10 points each
    assert_eq!(deployment.manager.balance(deployment.donor).await?, 50);

    // on the day, the receiver asks to scan and the donor agrees
    let record = deployment
        .manager
        .request_proof_token(deployment.ngo, record.id)
        .await?;
    let record = deployment
        .manager
        .accept_proof_request(deployment.donor, record.id)
        .await?;

    let generated = deployment
        .manager
        .generate_proof_token(deployment.donor, record.id, None)
        .await?;
    deployment.clock.advance_ms(2 * MINUTE_MS);

    let completed = deployment
        .manager
        .verify_and_complete(
            deployment.ngo,
            record.id,
            &generated.token,
            CompletionDetails {
                notes: Some("handed over at the loading dock".to_owned()),
                additional_points: 20,
            },
        )
        .await?;
    assert_eq!(completed.state, PickupState::Completed);
    assert_eq!(deployment.manager.balance(deployment.donor).await?, 70);

    // both parties were mailed about the completion, and nothing else
    let emails = deployment.context.sent_emails();
    assert_eq!(emails.len(), 2);

    // every credit is replayable from the event history
    assert!(deployment.context.ledger().read().unwrap().audit());
    Ok(())
}

#[rstest]
#[case::ngo(ReceiverKind::Ngo, 30)]
#[case::compost(ReceiverKind::CompostAgency, 15)]
#[tokio::test]
async fn base_points_follow_the_receiver_kind(
    #[case] kind: ReceiverKind,
    #[case] expected: u64,
) -> anyhow::Result<()> {
    let deployment = Deployment::new();
    let receiver = match kind {
        ReceiverKind::Ngo => deployment.ngo,
        ReceiverKind::CompostAgency => deployment.compost_agency,
    };
    let offer_id = deployment.seed_offer(receiver, kind, 3, "garden waste");

    deployment.manager.accept_offer(receiver, offer_id).await?;
    assert_eq!(
        deployment
            .manager
            .pair_balance(deployment.donor, receiver)
            .await?,
        expected
    );
    Ok(())
}

#[tokio::test]
async fn one_donor_runs_parallel_pickups_with_two_receivers() -> anyhow::Result<()> {
    let deployment = Deployment::new();
    let food = deployment.seed_offer(deployment.ngo, ReceiverKind::Ngo, 4, "food");
    let scraps =
        deployment.seed_offer(deployment.compost_agency, ReceiverKind::CompostAgency, 6, "scraps");

    let ngo_pickup = deployment
        .schedule_pickup(deployment.ngo, food, march(1), "10:00 AM")
        .await?;
    let compost_pickup = deployment
        .schedule_pickup(deployment.compost_agency, scraps, march(2), "2:00 PM")
        .await?;

    // balances are tracked per counterparty and summed on demand
    assert_eq!(
        deployment
            .manager
            .pair_balance(deployment.donor, deployment.ngo)
            .await?,
        40
    );
    assert_eq!(
        deployment
            .manager
            .pair_balance(deployment.donor, deployment.compost_agency)
            .await?,
        30
    );
    assert_eq!(deployment.manager.balance(deployment.donor).await?, 70);

    // completing one pickup leaves the other untouched
    let generated = deployment
        .manager
        .generate_proof_token(deployment.donor, ngo_pickup.id, None)
        .await?;
    deployment
        .manager
        .verify_and_complete(
            deployment.ngo,
            ngo_pickup.id,
            &generated.token,
            CompletionDetails {
                notes: None,
                additional_points: 0,
            },
        )
        .await?;
    assert_eq!(
        deployment
            .context
            .stored_pickup(compost_pickup.id)
            .unwrap()
            .state,
        PickupState::Scheduled
    );

    // redeeming against the NGO never touches the compost balance
    let remaining = deployment
        .manager
        .redeem_points(deployment.donor, deployment.ngo, 25)
        .await?;
    assert_eq!(remaining, 15);
    assert_eq!(
        deployment
            .manager
            .pair_balance(deployment.donor, deployment.compost_agency)
            .await?,
        30
    );
    assert_eq!(deployment.manager.balance(deployment.donor).await?, 45);

    // the aggregate balance cannot be spent against a single receiver
    let over = deployment
        .manager
        .redeem_points(deployment.donor, deployment.ngo, 40)
        .await;
    assert!(matches!(
        over,
        Err(Error::Ledger(LedgerError::InsufficientPoints {
            balance: 15,
            requested: 40,
        }))
    ));
    Ok(())
}

#[tokio::test]
async fn an_expired_token_is_retried_with_a_fresh_one() -> anyhow::Result<()> {
    let deployment = Deployment::new();
    let offer_id = deployment.seed_offer(deployment.ngo, ReceiverKind::Ngo, 2, "food");
    let record = deployment
        .schedule_pickup(deployment.ngo, offer_id, march(1), "9:00 AM")
        .await?;

    let stale = deployment
        .manager
        .generate_proof_token(deployment.donor, record.id, None)
        .await?;
    deployment.clock.advance_ms(6 * MINUTE_MS);

    let result = deployment
        .manager
        .verify_and_complete(
            deployment.ngo,
            record.id,
            &stale.token,
            CompletionDetails {
                notes: None,
                additional_points: 0,
            },
        )
        .await;
    assert!(matches!(result, Err(Error::ExpiredToken { .. })));

    let fresh = deployment
        .manager
        .generate_proof_token(deployment.donor, record.id, None)
        .await?;
    let completed = deployment
        .manager
        .verify_and_complete(
            deployment.ngo,
            record.id,
            &fresh.token,
            CompletionDetails {
                notes: None,
                additional_points: 0,
            },
        )
        .await?;
    assert_eq!(completed.state, PickupState::Completed);
    assert_eq!(completed.qr_generation_attempts, 2);

    // only the consumed entry is marked used
    let used = completed
        .qr_codes
        .iter()
        .filter(|e| e.status == QrStatus::Used)
        .count();
    assert_eq!(used, 1);
    Ok(())
}

#[tokio::test]
async fn racing_verifications_complete_the_pickup_exactly_once() -> anyhow::Result<()> {
    let deployment = Deployment::new();
    let offer_id = deployment.seed_offer(deployment.ngo, ReceiverKind::Ngo, 5, "food");
    let record = deployment
        .schedule_pickup(deployment.ngo, offer_id, march(1), "10:00 AM")
        .await?;
    let base = deployment.manager.balance(deployment.donor).await?;

    let generated = deployment
        .manager
        .generate_proof_token(deployment.donor, record.id, None)
        .await?;

    let details = CompletionDetails {
        notes: None,
        additional_points: 20,
    };
    let first = deployment.manager.verify_and_complete(
        deployment.ngo,
        record.id,
        &generated.token,
        details.clone(),
    );
    let second = deployment.manager.verify_and_complete(
        deployment.ngo,
        record.id,
        &generated.token,
        details,
    );
    let (first, second) = futures::join!(first, second);

    // whichever write lands second loses the version race or finds the
    // entry already consumed; either way the bonus is credited once
    assert!(first.is_ok() != second.is_ok());
    assert_eq!(deployment.manager.balance(deployment.donor).await?, base + 20);
    assert_eq!(
        deployment.context.stored_pickup(record.id).unwrap().state,
        PickupState::Completed
    );
    assert!(deployment.context.ledger().read().unwrap().audit());
    Ok(())
}

#[tokio::test]
async fn a_cancelled_pickup_keeps_its_base_points_and_goes_no_further() -> anyhow::Result<()> {
    let deployment = Deployment::new();
    let offer_id = deployment.seed_offer(deployment.ngo, ReceiverKind::Ngo, 5, "food");
    let record = deployment
        .schedule_pickup(deployment.ngo, offer_id, march(1), "10:00 AM")
        .await?;

    deployment
        .manager
        .cancel(
            deployment.donor,
            record.id,
            Some("moved house".to_owned()),
        )
        .await?;

    // acceptance-time credit is not clawed back
    assert_eq!(deployment.manager.balance(deployment.donor).await?, 50);

    // and the record is finished: no tokens, no completion, no deletion
    let result = deployment
        .manager
        .generate_proof_token(deployment.donor, record.id, None)
        .await;
    assert!(matches!(result, Err(Error::InvalidState { .. })));
    let result = deployment
        .manager
        .delete_completed(deployment.donor, record.id)
        .await;
    assert!(matches!(result, Err(Error::InvalidState { .. })));
    Ok(())
}
