// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::providers::fillers::BlobGasFiller;
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, FixedBytes, TxHash, U256},
    providers::fillers::{
        ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    providers::{Identity, ProviderBuilder, RootProvider},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use eyre::Report;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::error::LedgerError;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract ExamVault {
        function submitAnswer(string calldata examTitle, bytes32 encryptedAnswer, bytes calldata inputProof) external;
        function getTotalSubmissions() external view returns (uint256);
        function getSubmission(uint256 submissionId) external view returns (address student, string memory examTitle, uint256 timestamp, bool exists);
        function getStudentSubmissions(address student) external view returns (uint256[] memory);
        function submissionExists(uint256 submissionId) external view returns (bool);
        function requestDecryption(uint256 submissionId) external;
        function getEncryptedAnswer(uint256 submissionId) external view returns (bytes32);
    }
}

/// A submission tuple as stored by the ledger. `exists` is false and the
/// other fields zeroed for ids the ledger has never assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub student: Address,
    pub exam_title: String,
    pub timestamp: u64,
    pub exists: bool,
}

/// The slice of a transaction receipt the session actually consumes.
#[derive(Debug, Clone, Copy)]
pub struct TxOutcome {
    pub transaction_hash: TxHash,
    pub status: bool,
}

/// Trait for read-only operations on the ExamVault contract
#[async_trait]
pub trait ExamVaultRead: Send + Sync {
    /// Total number of submissions ever recorded
    async fn get_total_submissions(&self) -> Result<u64, LedgerError>;

    /// Submission metadata by id
    async fn get_submission(&self, submission_id: u64) -> Result<SubmissionRecord, LedgerError>;

    /// Ids of a student's submissions, in insertion order
    async fn get_student_submissions(&self, student: Address) -> Result<Vec<u64>, LedgerError>;

    /// Whether a submission id has been assigned
    async fn submission_exists(&self, submission_id: u64) -> Result<bool, LedgerError>;
}

/// Trait for caller-scoped operations on the ExamVault contract. The ledger
/// gates these by `msg.sender`, so they only exist on the wallet-backed
/// contract variant.
#[async_trait]
pub trait ExamVaultWrite: ExamVaultRead {
    /// Record an encrypted answer; the ledger assigns the next sequential id
    async fn submit_answer(
        &self,
        exam_title: &str,
        encrypted_answer: FixedBytes<32>,
        input_proof: Bytes,
    ) -> Result<TxOutcome, LedgerError>;

    /// Re-authorize decryption of an owned submission on-chain
    async fn request_decryption(&self, submission_id: u64) -> Result<TxOutcome, LedgerError>;

    /// Read the ciphertext handle of an owned submission. Reverts with
    /// "only the student" for any other caller.
    async fn get_encrypted_answer(&self, submission_id: u64)
        -> Result<FixedBytes<32>, LedgerError>;
}

/// Generic type to represent different provider types
pub trait ProviderType: Send + Sync {
    type Provider: Send + Sync + 'static;
}

/// Marker type for read-only provider
#[derive(Clone)]
pub struct ReadOnly;
impl ProviderType for ReadOnly {
    type Provider = ExamVaultReadOnlyProvider;
}
/// Marker type for read-write provider
#[derive(Clone)]
pub struct ReadWrite;
impl ProviderType for ReadWrite {
    type Provider = ExamVaultWriteProvider;
}

/// Generic ExamVault contract
#[derive(Clone)]
pub struct ExamVaultContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    caller: Option<Address>,
    _marker: PhantomData<T>,
}

impl<T: ProviderType> ExamVaultContract<T> {
    pub fn address(&self) -> &Address {
        &self.contract_address
    }

    /// The wallet address transactions are sent from, if this contract
    /// handle carries one.
    pub fn caller(&self) -> Option<Address> {
        self.caller
    }
}

impl ExamVaultContract<ReadWrite> {
    pub async fn new(
        http_rpc_url: &str,
        private_key: &str,
        contract_address: Address,
    ) -> Result<ExamVaultContract<ReadWrite>, LedgerError> {
        ExamVaultContractFactory::create_write(http_rpc_url, contract_address, private_key).await
    }
}

impl ExamVaultContract<ReadOnly> {
    pub async fn read_only(
        http_rpc_url: &str,
        contract_address: Address,
    ) -> Result<ExamVaultContract<ReadOnly>, LedgerError> {
        ExamVaultContractFactory::create_read(http_rpc_url, contract_address).await
    }
}

/// Type alias for read-only provider
pub type ExamVaultReadOnlyProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Type alias for read-write provider
pub type ExamVaultWriteProvider = FillProvider<
    JoinFill<
        JoinFill<
            JoinFill<
                Identity,
                JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
            >,
            WalletFiller<EthereumWallet>,
        >,
        NonceFiller,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

/// Type aliases for the two contract variants
pub type ExamVaultReadContract = ExamVaultContract<ReadOnly>;
pub type ExamVaultWriteContract = ExamVaultContract<ReadWrite>;

// Factory for creating contract instances
pub struct ExamVaultContractFactory;

impl ExamVaultContractFactory {
    /// Create a write-capable contract
    pub async fn create_write(
        http_rpc_url: &str,
        contract_address: Address,
        private_key: &str,
    ) -> Result<ExamVaultContract<ReadWrite>, LedgerError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| LedgerError::Transport(Report::msg(format!("invalid private key: {e}"))))?;
        let caller = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .with_cached_nonce_management()
            .connect(http_rpc_url)
            .await
            .map_err(|e| LedgerError::Transport(Report::new(e)))?;

        debug!(contract = %contract_address, caller = %caller, "connected write provider");
        Ok(ExamVaultContract::<ReadWrite> {
            provider: Arc::new(provider),
            contract_address,
            caller: Some(caller),
            _marker: PhantomData,
        })
    }

    /// Create a read-only contract
    pub async fn create_read(
        http_rpc_url: &str,
        contract_address: Address,
    ) -> Result<ExamVaultContract<ReadOnly>, LedgerError> {
        let provider = ProviderBuilder::new()
            .connect(http_rpc_url)
            .await
            .map_err(|e| LedgerError::Transport(Report::new(e)))?;

        Ok(ExamVaultContract::<ReadOnly> {
            provider: Arc::new(provider),
            contract_address,
            caller: None,
            _marker: PhantomData,
        })
    }
}

fn u64_try_from(input: U256) -> Result<u64, LedgerError> {
    u64::try_from(input).map_err(|_| LedgerError::Transport(Report::msg("larger than 64-bit")))
}

// Implement ExamVaultRead for any ExamVaultContract regardless of provider type
#[async_trait]
impl<T> ExamVaultRead for ExamVaultContract<T>
where
    T: ProviderType,
    T::Provider: alloy::providers::Provider,
{
    async fn get_total_submissions(&self) -> Result<u64, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        let total = contract
            .getTotalSubmissions()
            .call()
            .await
            .map_err(LedgerError::from_contract)?;
        u64_try_from(total)
    }

    async fn get_submission(&self, submission_id: u64) -> Result<SubmissionRecord, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        let ret = contract
            .getSubmission(U256::from(submission_id))
            .call()
            .await
            .map_err(LedgerError::from_contract)?;
        Ok(SubmissionRecord {
            student: ret.student,
            exam_title: ret.examTitle,
            timestamp: u64_try_from(ret.timestamp)?,
            exists: ret.exists,
        })
    }

    async fn get_student_submissions(&self, student: Address) -> Result<Vec<u64>, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        let ids = contract
            .getStudentSubmissions(student)
            .call()
            .await
            .map_err(LedgerError::from_contract)?;
        ids.into_iter().map(u64_try_from).collect()
    }

    async fn submission_exists(&self, submission_id: u64) -> Result<bool, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        contract
            .submissionExists(U256::from(submission_id))
            .call()
            .await
            .map_err(LedgerError::from_contract)
    }
}

// Implement ExamVaultWrite only for contracts with ReadWrite marker
#[async_trait]
impl ExamVaultWrite for ExamVaultContract<ReadWrite> {
    async fn submit_answer(
        &self,
        exam_title: &str,
        encrypted_answer: FixedBytes<32>,
        input_proof: Bytes,
    ) -> Result<TxOutcome, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        let builder = contract.submitAnswer(exam_title.to_owned(), encrypted_answer, input_proof);
        let receipt = builder
            .send()
            .await
            .map_err(LedgerError::from_contract)?
            .get_receipt()
            .await
            .map_err(|e| LedgerError::Transport(Report::new(e)))?;
        debug!(tx = %receipt.transaction_hash, title = exam_title, "submitAnswer confirmed");
        Ok(TxOutcome {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status(),
        })
    }

    async fn request_decryption(&self, submission_id: u64) -> Result<TxOutcome, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        let builder = contract.requestDecryption(U256::from(submission_id));
        let receipt = builder
            .send()
            .await
            .map_err(LedgerError::from_contract)?
            .get_receipt()
            .await
            .map_err(|e| LedgerError::Transport(Report::new(e)))?;
        debug!(tx = %receipt.transaction_hash, submission_id, "requestDecryption confirmed");
        Ok(TxOutcome {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status(),
        })
    }

    async fn get_encrypted_answer(
        &self,
        submission_id: u64,
    ) -> Result<FixedBytes<32>, LedgerError> {
        let contract = ExamVault::new(self.contract_address, &self.provider);
        let mut call = contract.getEncryptedAnswer(U256::from(submission_id));
        // The ledger gates this view by msg.sender
        if let Some(caller) = self.caller {
            call = call.from(caller);
        }
        call.call().await.map_err(LedgerError::from_contract)
    }
}
