// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod common;

use common::{binding_for, connect_user, harness};
use std::time::Duration;
use tokio::time::sleep;

use alloy::primitives::address;
use ev_evm_helpers::{ExamVaultRead, ExamVaultWrite};
use ev_session::{SessionBinding, SessionError};

#[tokio::test]
async fn submit_records_and_refreshes() {
    let h = harness();

    h.session
        .submit("Mathematics Final - Chapter 5", "the quadratic formula")
        .await
        .unwrap();

    assert_eq!(h.ledger.get_total_submissions().await.unwrap(), 1);
    let record = h.ledger.get_submission(0).await.unwrap();
    assert!(record.exists);
    assert_eq!(record.student, h.account);
    assert_eq!(record.exam_title, "Mathematics Final - Chapter 5");
    assert!(record.timestamp > 0);

    // The session refreshed its own view after confirmation
    let submissions = h.session.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].id, 0);
    assert_eq!(submissions[0].exam_title, "Mathematics Final - Chapter 5");
}

#[tokio::test]
async fn empty_title_and_answer_fail_before_the_ledger() {
    let h = harness();

    assert!(matches!(
        h.session.submit("", "anything").await,
        Err(SessionError::EmptyTitle)
    ));
    assert!(matches!(
        h.session.submit("Physics Exam", "").await,
        Err(SessionError::EmptyAnswer)
    ));
    assert_eq!(h.ledger.get_total_submissions().await.unwrap(), 0);
}

#[tokio::test]
async fn submit_is_single_flight() {
    let h = harness();
    h.ledger.set_latency(Duration::from_millis(150));

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.submit("Physics Exam", "f = ma").await });
    sleep(Duration::from_millis(30)).await;

    // Second call while the first is still confirming: a no-op
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    assert_eq!(h.ledger.get_total_submissions().await.unwrap(), 0);

    first.await.unwrap().unwrap();
    assert_eq!(h.ledger.get_total_submissions().await.unwrap(), 1);
}

#[tokio::test]
async fn refresh_is_single_flight() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    h.ledger.set_latency(Duration::from_millis(150));

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.refresh().await });
    sleep(Duration::from_millis(30)).await;

    assert!(h.session.is_refreshing());
    // Returns immediately without a second fetch
    h.session.refresh().await.unwrap();

    first.await.unwrap().unwrap();
    assert_eq!(h.session.submissions().await.len(), 1);
}

#[tokio::test]
async fn superseded_refresh_discards_its_result() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    assert_eq!(h.session.submissions().await.len(), 1);

    // A second submission lands outside the session
    h.ledger
        .submit_answer(
            "Chemistry Exam",
            alloy::primitives::FixedBytes::repeat_byte(7),
            Default::default(),
        )
        .await
        .unwrap();

    h.ledger.set_latency(Duration::from_millis(150));
    let session = h.session.clone();
    let refresh = tokio::spawn(async move { session.refresh().await });
    sleep(Duration::from_millis(30)).await;

    // Contract changes mid-fetch: the fetched list must not be applied
    h.session
        .set_binding(SessionBinding {
            contract_address: address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            ..binding_for(h.account)
        })
        .await;

    refresh.await.unwrap().unwrap();
    assert_eq!(h.session.submissions().await.len(), 1);
}

#[tokio::test]
async fn stale_submit_completes_without_refreshing() {
    let h = harness();
    h.ledger.set_latency(Duration::from_millis(150));

    let session = h.session.clone();
    let submit = tokio::spawn(async move { session.submit("Physics Exam", "f = ma").await });
    sleep(Duration::from_millis(30)).await;

    // Account switches while the transaction is confirming
    let other = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    h.session
        .set_binding(SessionBinding {
            account: other,
            ..binding_for(h.account)
        })
        .await;

    // The on-chain effect stands, but the stale context's view is untouched
    submit.await.unwrap().unwrap();
    assert_eq!(h.ledger.get_total_submissions().await.unwrap(), 1);
    assert!(h.session.submissions().await.is_empty());
    assert_eq!(
        h.session.message().await,
        "Submit completed but context is stale"
    );
}

#[tokio::test]
async fn declined_submit_transaction_reports_cancelled() {
    let h = harness();
    h.ledger.set_decline_writes(true);

    let result = h.session.submit("Physics Exam", "f = ma").await;
    assert!(matches!(result, Err(SessionError::Declined)));
    assert_eq!(h.session.message().await, "Submit cancelled by user");
    assert_eq!(h.ledger.get_total_submissions().await.unwrap(), 0);
}

#[tokio::test]
async fn end_to_end_scenario() {
    let alice = harness();
    let bob = connect_user(&alice);

    let before = alice.ledger.get_total_submissions().await.unwrap();
    alice
        .session
        .submit("Biology Exam", "the mitochondria is the powerhouse")
        .await
        .unwrap();
    assert_eq!(
        alice.ledger.get_total_submissions().await.unwrap(),
        before + 1
    );

    let record = alice.ledger.get_submission(0).await.unwrap();
    assert_eq!(record.student, alice.account);
    assert_eq!(record.exam_title, "Biology Exam");
    assert!(record.timestamp > 0);
    assert!(record.exists);

    let value = alice.session.decrypt(0).await.unwrap();
    assert_eq!(
        value,
        Some(ev_session::answer_surrogate(
            "the mitochondria is the powerhouse"
        ))
    );

    // Bob cannot decrypt Alice's submission, via the session or directly
    assert!(bob.session.decrypt(0).await.is_err());
    assert!(bob.ledger.get_encrypted_answer(0).await.is_err());
}
