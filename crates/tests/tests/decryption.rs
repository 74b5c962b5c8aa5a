// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod common;

use common::{binding_for, connect_user, harness, CONTRACT};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;

use alloy::primitives::address;
use ev_fhevm::{DecryptionSignature, GenericStringStorage};
use ev_session::{answer_surrogate, SessionBinding, SessionError};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[tokio::test]
async fn round_trip_recovers_the_surrogate() {
    let h = harness();
    let answer = "osmosis moves water across membranes";
    h.session.submit("Biology Exam", answer).await.unwrap();

    let value = h.session.decrypt(0).await.unwrap();
    assert_eq!(value, Some(answer_surrogate(answer)));
    assert_eq!(h.session.message().await, "Decryption completed");
}

#[tokio::test]
async fn decrypt_with_original_consults_the_local_cache() {
    let h = harness();
    let answer = "a eukaryotic cell has a nucleus";
    h.session.submit("Biology Exam", answer).await.unwrap();

    let decrypted = h.session.decrypt_with_original(0).await.unwrap().unwrap();
    assert_eq!(decrypted.id, 0);
    assert_eq!(decrypted.exam_title, "Biology Exam");
    assert_eq!(decrypted.value, answer_surrogate(answer));
    // Saved at submit time, matched through the fuzzy timestamp window
    assert_eq!(decrypted.original_answer.as_deref(), Some(answer));
}

#[tokio::test]
async fn credential_is_reused_within_its_validity_window() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    h.session.submit("Chemistry Exam", "avogadro").await.unwrap();

    assert!(h.session.decrypt(0).await.unwrap().is_some());
    assert!(h.session.decrypt(1).await.unwrap().is_some());

    // Two decrypts, one wallet prompt
    assert_eq!(h.signer.sign_requests(), 1);
}

#[tokio::test]
async fn expired_credential_forces_a_new_signature() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();

    // Plant an expired credential exactly where the manager would look
    let expired = DecryptionSignature {
        public_key: "0x00".into(),
        private_key: "0x00".into(),
        signature: "0x00".into(),
        contract_addresses: vec![CONTRACT],
        user_address: h.account,
        start_timestamp: unix_now() - 2 * 86_400,
        duration_days: 1,
    };
    let key = DecryptionSignature::storage_key(h.account, &[CONTRACT]);
    h.storage
        .set_item(&key, &serde_json::to_string(&expired).unwrap())
        .await
        .unwrap();

    assert!(h.session.decrypt(0).await.unwrap().is_some());
    assert_eq!(h.signer.sign_requests(), 1);
}

#[tokio::test]
async fn declined_signature_yields_no_authorization() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    h.signer.set_decline(true);

    let result = h.session.decrypt(0).await;
    assert!(matches!(result, Err(SessionError::NoDecryptionSignature)));
    assert_eq!(
        h.session.message().await,
        "Unable to build decryption authorization"
    );

    // Recovery: the user accepts the next prompt
    h.signer.set_decline(false);
    assert!(h.session.decrypt(0).await.unwrap().is_some());
}

#[tokio::test]
async fn declined_authorization_transaction_reports_cancelled() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    h.ledger.set_decline_writes(true);

    let result = h.session.decrypt(0).await;
    assert!(matches!(result, Err(SessionError::Declined)));
    assert_eq!(h.session.message().await, "Decryption cancelled by user");
}

#[tokio::test]
async fn decrypt_is_single_flight() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    h.ledger.set_latency(Duration::from_millis(150));

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.decrypt(0).await });
    sleep(Duration::from_millis(30)).await;

    // Second call while the first is in flight: no duplicate authorization
    assert_eq!(h.session.decrypt(0).await.unwrap(), None);

    assert!(first.await.unwrap().unwrap().is_some());
    assert_eq!(h.signer.sign_requests(), 1);
}

#[tokio::test]
async fn stale_decrypt_withholds_the_value() {
    let h = harness();
    h.session.submit("Physics Exam", "f = ma").await.unwrap();
    h.ledger.set_latency(Duration::from_millis(150));

    let session = h.session.clone();
    let decrypt = tokio::spawn(async move { session.decrypt(0).await });
    sleep(Duration::from_millis(30)).await;

    let other = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    h.session
        .set_binding(SessionBinding {
            account: other,
            ..binding_for(h.account)
        })
        .await;

    // The decryption itself completed, but the context moved on
    assert_eq!(decrypt.await.unwrap().unwrap(), None);
    assert_eq!(
        h.session.message().await,
        "Decryption completed but context is stale"
    );
}

#[tokio::test]
async fn non_author_is_rejected_at_authorization() {
    let alice = harness();
    let bob = connect_user(&alice);
    alice.session.submit("Biology Exam", "ribosomes").await.unwrap();

    let result = bob.session.decrypt(0).await;
    assert!(matches!(result, Err(SessionError::Ledger(_))));
}
