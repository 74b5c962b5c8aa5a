// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, FixedBytes, TxHash};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use ev_evm_helpers::{ExamVaultRead, ExamVaultWrite, LedgerError, SubmissionRecord, TxOutcome};

#[derive(Debug, Clone)]
struct StoredSubmission {
    student: Address,
    exam_title: String,
    timestamp: u64,
    handle: FixedBytes<32>,
}

#[derive(Default)]
struct LedgerState {
    submissions: Vec<StoredSubmission>,
    by_student: HashMap<Address, Vec<u64>>,
    authorized: HashSet<(u64, Address)>,
}

/// In-memory ExamVault contract. Each handle is bound to a caller, the way an
/// alloy contract instance is bound to a wallet; `connect` derives another
/// caller's handle over the same ledger state.
///
/// Knobs for orchestration tests: `set_latency` injects a pause into
/// caller-visible operations, `set_decline_writes` makes transactions fail as
/// if the wallet rejected them.
#[derive(Clone)]
pub struct MockLedger {
    state: Arc<RwLock<LedgerState>>,
    caller: Address,
    latency_ms: Arc<AtomicU64>,
    decline_writes: Arc<AtomicBool>,
    tx_counter: Arc<AtomicU64>,
}

impl MockLedger {
    pub fn new(caller: Address) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            caller,
            latency_ms: Arc::new(AtomicU64::new(0)),
            decline_writes: Arc::new(AtomicBool::new(false)),
            tx_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A handle over the same ledger state, sending from `caller`.
    pub fn connect(&self, caller: Address) -> MockLedger {
        MockLedger {
            caller,
            ..self.clone()
        }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Injected latency for subsequent operations, shared by all connections.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// When set, write operations fail as if the user rejected the
    /// transaction in their wallet.
    pub fn set_decline_writes(&self, decline: bool) {
        self.decline_writes.store(decline, Ordering::SeqCst);
    }

    async fn pause(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn next_tx_hash(&self) -> TxHash {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        keccak256(n.to_be_bytes())
    }

    fn check_declined(&self) -> Result<(), LedgerError> {
        if self.decline_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Declined);
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait]
impl ExamVaultRead for MockLedger {
    async fn get_total_submissions(&self) -> Result<u64, LedgerError> {
        Ok(self.state.read().await.submissions.len() as u64)
    }

    async fn get_submission(&self, submission_id: u64) -> Result<SubmissionRecord, LedgerError> {
        self.pause().await;
        let state = self.state.read().await;
        match state.submissions.get(submission_id as usize) {
            Some(s) => Ok(SubmissionRecord {
                student: s.student,
                exam_title: s.exam_title.clone(),
                timestamp: s.timestamp,
                exists: true,
            }),
            None => Ok(SubmissionRecord {
                student: Address::ZERO,
                exam_title: String::new(),
                timestamp: 0,
                exists: false,
            }),
        }
    }

    async fn get_student_submissions(&self, student: Address) -> Result<Vec<u64>, LedgerError> {
        self.pause().await;
        let state = self.state.read().await;
        Ok(state.by_student.get(&student).cloned().unwrap_or_default())
    }

    async fn submission_exists(&self, submission_id: u64) -> Result<bool, LedgerError> {
        let state = self.state.read().await;
        Ok((submission_id as usize) < state.submissions.len())
    }
}

#[async_trait]
impl ExamVaultWrite for MockLedger {
    async fn submit_answer(
        &self,
        exam_title: &str,
        encrypted_answer: FixedBytes<32>,
        _input_proof: alloy::primitives::Bytes,
    ) -> Result<TxOutcome, LedgerError> {
        self.check_declined()?;
        self.pause().await;
        if exam_title.is_empty() {
            return Err(LedgerError::Reverted("Exam title cannot be empty".into()));
        }

        let mut state = self.state.write().await;
        let id = state.submissions.len() as u64;
        state.submissions.push(StoredSubmission {
            student: self.caller,
            exam_title: exam_title.to_string(),
            timestamp: unix_now(),
            handle: encrypted_answer,
        });
        state.by_student.entry(self.caller).or_default().push(id);

        Ok(TxOutcome {
            transaction_hash: self.next_tx_hash(),
            status: true,
        })
    }

    async fn request_decryption(&self, submission_id: u64) -> Result<TxOutcome, LedgerError> {
        self.check_declined()?;
        self.pause().await;
        let mut state = self.state.write().await;
        let submission = state
            .submissions
            .get(submission_id as usize)
            .cloned()
            .ok_or_else(|| LedgerError::Reverted("Submission does not exist".into()))?;
        if submission.student != self.caller {
            return Err(LedgerError::Reverted(
                "Only the student can request decryption".into(),
            ));
        }
        state.authorized.insert((submission_id, self.caller));

        Ok(TxOutcome {
            transaction_hash: self.next_tx_hash(),
            status: true,
        })
    }

    async fn get_encrypted_answer(
        &self,
        submission_id: u64,
    ) -> Result<FixedBytes<32>, LedgerError> {
        let state = self.state.read().await;
        let submission = state
            .submissions
            .get(submission_id as usize)
            .ok_or_else(|| LedgerError::Reverted("Submission does not exist".into()))?;
        if submission.student != self.caller {
            return Err(LedgerError::Reverted(
                "revert: Only the student can view their answer".into(),
            ));
        }
        if !state.authorized.contains(&(submission_id, self.caller)) {
            return Err(LedgerError::Reverted(
                "revert: Decryption has not been authorized".into(),
            ));
        }
        Ok(submission.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn handle(n: u8) -> FixedBytes<32> {
        FixedBytes::repeat_byte(n)
    }

    #[tokio::test]
    async fn assigns_dense_sequential_ids_per_author() {
        let alice = MockLedger::new(ALICE);
        let bob = alice.connect(BOB);
        alice.submit_answer("Physics", handle(1), Default::default()).await.unwrap();
        bob.submit_answer("Physics", handle(2), Default::default()).await.unwrap();
        alice.submit_answer("Chemistry", handle(3), Default::default()).await.unwrap();

        assert_eq!(alice.get_total_submissions().await.unwrap(), 3);
        assert_eq!(alice.get_student_submissions(ALICE).await.unwrap(), vec![0, 2]);
        assert_eq!(bob.get_student_submissions(BOB).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn rejects_empty_title() {
        let ledger = MockLedger::new(ALICE);
        let err = ledger
            .submit_answer("", handle(1), Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Reverted(_)));
    }

    #[tokio::test]
    async fn unknown_id_reads_as_zeroed_nonexistent() {
        let ledger = MockLedger::new(ALICE);
        let record = ledger.get_submission(5).await.unwrap();
        assert!(!record.exists);
        assert_eq!(record.student, Address::ZERO);
        assert!(!ledger.submission_exists(5).await.unwrap());
    }

    #[tokio::test]
    async fn gates_encrypted_answer_by_author_and_authorization() {
        let alice = MockLedger::new(ALICE);
        let bob = alice.connect(BOB);
        alice.submit_answer("Biology", handle(9), Default::default()).await.unwrap();

        // Unauthorized read by the author
        assert!(alice.get_encrypted_answer(0).await.is_err());
        // Authorization by a non-author
        assert!(bob.request_decryption(0).await.is_err());

        alice.request_decryption(0).await.unwrap();
        assert_eq!(alice.get_encrypted_answer(0).await.unwrap(), handle(9));
        // Still gated for anyone else
        assert!(bob.get_encrypted_answer(0).await.is_err());
    }

    #[tokio::test]
    async fn declined_writes_surface_as_declined() {
        let ledger = MockLedger::new(ALICE);
        ledger.set_decline_writes(true);
        let err = ledger
            .submit_answer("Physics", handle(1), Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Declined));
    }
}
