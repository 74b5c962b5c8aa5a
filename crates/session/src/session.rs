// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use eyre::eyre;
use futures::future::try_join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use ev_evm_helpers::{ExamVaultWrite, LedgerError};
use ev_fhevm::{
    DecryptionSignature, FhevmInstance, GenericStringStorage, HandleContractPair, WalletSigner,
};

use crate::answer_cache::AnswerCache;
use crate::binding::SessionBinding;
use crate::error::SessionError;
use crate::state::{DecryptedAnswer, SessionState, Submission};
use crate::surrogate::answer_surrogate;

/// Orchestrates submit/refresh/decrypt against the ExamVault ledger for one
/// wallet context.
///
/// Concurrency model: each operation kind is single-flight (a synchronous
/// atomic guard taken before any await point), and every operation captures
/// the session binding at its start, re-checking it before committing
/// results. A binding change is the implicit cancellation mechanism: stale
/// operations discard their own results instead of clobbering a newer
/// context's view.
pub struct VaultSession<L, F, W, S> {
    ledger: Option<Arc<L>>,
    instance: Option<Arc<F>>,
    signer: Option<Arc<W>>,
    storage: Arc<S>,
    answer_cache: AnswerCache<S>,
    binding: RwLock<SessionBinding>,
    state: RwLock<SessionState>,
    is_submitting: AtomicBool,
    is_refreshing: AtomicBool,
    is_decrypting: AtomicBool,
}

impl<L, F, W, S> VaultSession<L, F, W, S>
where
    L: ExamVaultWrite,
    F: FhevmInstance,
    W: WalletSigner,
    S: GenericStringStorage,
{
    pub fn new(binding: SessionBinding, storage: Arc<S>) -> Self {
        Self {
            ledger: None,
            instance: None,
            signer: None,
            answer_cache: AnswerCache::new(storage.clone()),
            storage,
            binding: RwLock::new(binding),
            state: RwLock::new(SessionState::default()),
            is_submitting: AtomicBool::new(false),
            is_refreshing: AtomicBool::new(false),
            is_decrypting: AtomicBool::new(false),
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<L>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_instance(mut self, instance: Arc<F>) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_signer(mut self, signer: Arc<W>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Wallet/network event entry point. In-flight operations observe the
    /// change at their next staleness checkpoint and discard their results.
    pub async fn set_binding(&self, binding: SessionBinding) {
        let mut current = self.binding.write().await;
        if *current != binding {
            info!(chain_id = binding.chain_id, account = %binding.account, "session binding changed");
            *current = binding;
        }
    }

    pub async fn binding(&self) -> SessionBinding {
        *self.binding.read().await
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.state.read().await.submissions.clone()
    }

    /// Latest user-facing progress/status message.
    pub async fn message(&self) -> String {
        self.state.read().await.message.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing.load(Ordering::SeqCst)
    }

    pub fn is_decrypting(&self) -> bool {
        self.is_decrypting.load(Ordering::SeqCst)
    }

    async fn set_message(&self, message: &str) {
        self.state.write().await.message = message.to_string();
    }

    async fn is_stale(&self, snapshot: &SessionBinding) -> bool {
        *self.binding.read().await != *snapshot
    }

    /// Encrypt `answer_text`'s surrogate for the current context and record
    /// it on the ledger under `exam_title`. A no-op while another submit is
    /// in flight.
    pub async fn submit(&self, exam_title: &str, answer_text: &str) -> Result<(), SessionError> {
        let Some(_guard) = FlightGuard::acquire(&self.is_submitting) else {
            debug!("submit already in flight, ignoring");
            return Ok(());
        };

        let result = self.do_submit(exam_title, answer_text).await;
        match &result {
            Ok(()) => {}
            Err(SessionError::Cancelled) => self.set_message("Submit cancelled").await,
            Err(SessionError::Declined) => self.set_message("Submit cancelled by user").await,
            Err(e) => self.set_message(&format!("Submit failed: {e}")).await,
        }
        result
    }

    async fn do_submit(&self, exam_title: &str, answer_text: &str) -> Result<(), SessionError> {
        let ledger = self.ledger.as_ref().ok_or(SessionError::NotDeployed)?;
        let instance = self.instance.as_ref().ok_or(SessionError::InstanceNotReady)?;
        self.signer.as_ref().ok_or(SessionError::NoAccount)?;
        if exam_title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        if answer_text.is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        // Captured before the first suspension point; compared at every
        // checkpoint below.
        let snapshot = self.binding().await;

        self.set_message("Encrypting answer...").await;

        // Best-effort side channel so decrypt can show the original text
        self.answer_cache
            .save(exam_title, answer_text, unix_now())
            .await;

        let value = answer_surrogate(answer_text);
        let enc = instance
            .create_encrypted_input(snapshot.contract_address, snapshot.account)
            .add64(value)
            .encrypt()
            .await
            .map_err(SessionError::Capability)?;
        let handle = enc
            .handles
            .first()
            .copied()
            .ok_or_else(|| SessionError::Capability(eyre!("encryption yielded no handle")))?;

        if self.is_stale(&snapshot).await {
            return Err(SessionError::Cancelled);
        }

        self.set_message("Submitting to the ledger...").await;
        let tx = ledger
            .submit_answer(exam_title, handle, enc.input_proof)
            .await?;
        if !tx.status {
            return Err(SessionError::Ledger(LedgerError::Reverted(format!(
                "submit transaction {} reverted",
                tx.transaction_hash
            ))));
        }
        info!(tx = %tx.transaction_hash, title = exam_title, "exam answer submitted");

        if self.is_stale(&snapshot).await {
            // The on-chain effect stands; just don't refresh a view that no
            // longer belongs to this context.
            self.set_message("Submit completed but context is stale").await;
            return Ok(());
        }

        self.set_message("Exam submitted successfully").await;
        self.refresh().await
    }

    /// Re-fetch the current account's submissions. The result is committed
    /// only if the chain and contract are unchanged since the fetch started;
    /// a superseded refresh silently discards its result.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let Some(_guard) = FlightGuard::acquire(&self.is_refreshing) else {
            debug!("refresh already in flight, ignoring");
            return Ok(());
        };

        let ledger = self.ledger.as_ref().ok_or(SessionError::NotDeployed)?;
        self.signer.as_ref().ok_or(SessionError::NoAccount)?;

        let snapshot = self.binding().await;

        let result: Result<Vec<Submission>, LedgerError> = async {
            let ids = ledger.get_student_submissions(snapshot.account).await?;
            let fetches = ids.into_iter().map(|id| async move {
                let record = ledger.get_submission(id).await?;
                Ok::<_, LedgerError>(Submission {
                    id,
                    student: record.student,
                    exam_title: record.exam_title,
                    timestamp: record.timestamp,
                    exists: record.exists,
                })
            });
            try_join_all(fetches).await
        }
        .await;

        let submissions = match result {
            Ok(submissions) => submissions,
            Err(e) => {
                self.set_message(&format!("Failed to load submissions: {e}"))
                    .await;
                return Err(e.into());
            }
        };

        let current = self.binding().await;
        if snapshot.same_contract(&current) {
            debug!(count = submissions.len(), "submission list refreshed");
            self.state.write().await.submissions = submissions;
        } else {
            debug!("discarding superseded refresh result");
        }
        Ok(())
    }

    /// Decrypt an owned submission's surrogate value. Returns `Ok(None)` when
    /// another decrypt is in flight or the context went stale after the
    /// decryption completed.
    pub async fn decrypt(&self, submission_id: u64) -> Result<Option<u64>, SessionError> {
        let Some(_guard) = FlightGuard::acquire(&self.is_decrypting) else {
            debug!("decrypt already in flight, ignoring");
            return Ok(None);
        };

        let result = self.do_decrypt(submission_id).await;
        match &result {
            Ok(Some(_)) => self.set_message("Decryption completed").await,
            Ok(None) => {}
            Err(SessionError::Cancelled) => self.set_message("Decryption cancelled").await,
            Err(SessionError::Declined) => self.set_message("Decryption cancelled by user").await,
            Err(SessionError::NoDecryptionSignature) => {
                self.set_message("Unable to build decryption authorization")
                    .await
            }
            Err(e) => self.set_message(&format!("Decryption failed: {e}")).await,
        }
        result
    }

    async fn do_decrypt(&self, submission_id: u64) -> Result<Option<u64>, SessionError> {
        let ledger = self.ledger.as_ref().ok_or(SessionError::NotDeployed)?;
        let instance = self.instance.as_ref().ok_or(SessionError::InstanceNotReady)?;
        let signer = self.signer.as_ref().ok_or(SessionError::NoAccount)?;

        let snapshot = self.binding().await;
        self.set_message("Starting decryption...").await;

        let sig = DecryptionSignature::load_or_sign(
            instance.as_ref(),
            &[snapshot.contract_address],
            signer.as_ref(),
            self.storage.as_ref(),
        )
        .await
        .ok_or(SessionError::NoDecryptionSignature)?;

        if self.is_stale(&snapshot).await {
            return Err(SessionError::Cancelled);
        }

        // The ledger enforces author-only reads, so decryption must be
        // re-authorized on-chain before the handle is fetched. Fetching first
        // would race an unauthorized read.
        self.set_message("Requesting on-chain decryption authorization...")
            .await;
        let tx = ledger.request_decryption(submission_id).await?;
        if !tx.status {
            return Err(SessionError::Ledger(LedgerError::Reverted(format!(
                "authorization transaction {} reverted",
                tx.transaction_hash
            ))));
        }

        self.set_message("Fetching encrypted handle...").await;
        let handle = ledger.get_encrypted_answer(submission_id).await?;

        self.set_message("Decrypting...").await;
        let pairs = [HandleContractPair {
            handle,
            contract_address: snapshot.contract_address,
        }];
        let plaintexts = instance
            .user_decrypt(
                &pairs,
                &sig.private_key,
                &sig.public_key,
                &sig.signature,
                &sig.contract_addresses,
                sig.user_address,
                sig.start_timestamp,
                sig.duration_days,
            )
            .await
            .map_err(SessionError::Capability)?;
        let value = plaintexts
            .get(&handle)
            .copied()
            .ok_or_else(|| SessionError::Capability(eyre!("no plaintext for handle {handle}")))?;

        if self.is_stale(&snapshot).await {
            self.set_message("Decryption completed but context is stale")
                .await;
            return Ok(None);
        }

        Ok(Some(value))
    }

    /// Decrypt and additionally consult the local answer cache for the
    /// original text. The cache hit is a convenience; `value` is the only
    /// verified field.
    pub async fn decrypt_with_original(
        &self,
        submission_id: u64,
    ) -> Result<Option<DecryptedAnswer>, SessionError> {
        let Some(value) = self.decrypt(submission_id).await? else {
            return Ok(None);
        };

        let meta = self
            .submissions()
            .await
            .into_iter()
            .find(|s| s.id == submission_id);
        let (exam_title, timestamp) = match meta {
            Some(s) => (s.exam_title, s.timestamp),
            None => {
                let ledger = self.ledger.as_ref().ok_or(SessionError::NotDeployed)?;
                let record = ledger.get_submission(submission_id).await?;
                (record.exam_title, record.timestamp)
            }
        };

        let original_answer = self.answer_cache.lookup(&exam_title, timestamp).await;
        if original_answer.is_none() {
            warn!(
                id = submission_id,
                "original answer not cached locally; only the verified fingerprint is available"
            );
        }

        Ok(Some(DecryptedAnswer {
            id: submission_id,
            exam_title,
            value,
            original_answer,
        }))
    }
}

/// Single-flight guard: taken synchronously before any suspension point,
/// always released when the operation ends, whatever the outcome.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
