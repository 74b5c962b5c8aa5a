use crate::telemetry::setup_tracing;
use crate::{decrypt, list, submit};
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use clap::{command, ArgAction, Parser, Subcommand};
use ev_evm_helpers::{ExamVaultContractFactory, ExamVaultWriteContract};
use ev_fhevm::{InMemoryStorage, RelayerClient};
use ev_session::{SessionBinding, VaultSession};
use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::{info, Level};

/// The session shape every subcommand operates on: a wallet-backed contract,
/// a relayer-backed FHEVM instance and per-process credential storage.
pub type CliSession =
    VaultSession<ExamVaultWriteContract, RelayerClient, PrivateKeySigner, InMemoryStorage>;

#[derive(Parser, Debug)]
#[command(name = "examvault")]
#[command(about = "Submit and decrypt confidential exam answers on an FHEVM ledger", long_about = None)]
pub struct Cli {
    /// HTTP RPC endpoint of the target chain
    #[arg(long, env = "EXAMVAULT_RPC_URL", default_value = "http://localhost:8545")]
    rpc_url: String,

    /// FHEVM relayer endpoint for input proofs and user decryption
    #[arg(long, env = "EXAMVAULT_RELAYER_URL", default_value = "http://localhost:3000")]
    relayer_url: String,

    /// Hex-encoded private key of the student wallet
    #[arg(long, env = "EXAMVAULT_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// ExamVault contract address; defaults to the known deployment for the
    /// connected chain
    #[arg(long, env = "EXAMVAULT_CONTRACT_ADDRESS")]
    contract_address: Option<Address>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate log levels by adding additional `-v` arguments. Eg. `examvault -vvv`
    /// will give you trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt an answer client-side and record it on the ledger
    Submit {
        /// Title the submission is recorded under
        exam_title: String,
        /// Plaintext answer; only its encrypted fingerprint leaves this machine
        answer: String,
    },
    /// List the wallet's submissions
    List,
    /// Decrypt an owned submission's fingerprint
    Decrypt {
        /// Submission id as shown by `list`
        submission_id: u64,
    },
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    pub async fn execute(self) -> Result<()> {
        setup_tracing(self.log_level());

        let signer: PrivateKeySigner = self.private_key.parse()?;
        let account = signer.address();

        let provider = ProviderBuilder::new().connect(&self.rpc_url).await?;
        let chain_id = provider.get_chain_id().await?;

        let contract_address = match self.contract_address {
            Some(address) => address,
            None => ev_evm_helpers::deployments::examvault_address(chain_id).ok_or_else(|| {
                eyre!("no known ExamVault deployment for chain {chain_id}; pass --contract-address")
            })?,
        };
        info!(chain_id, contract = %contract_address, account = %account, "connected");

        let ledger =
            ExamVaultContractFactory::create_write(&self.rpc_url, contract_address, &self.private_key)
                .await?;
        let instance = RelayerClient::new(&self.relayer_url);
        let storage = Arc::new(InMemoryStorage::new());

        let binding = SessionBinding {
            chain_id,
            account,
            contract_address,
        };
        let session: CliSession = VaultSession::new(binding, storage)
            .with_ledger(Arc::new(ledger))
            .with_instance(Arc::new(instance))
            .with_signer(Arc::new(signer));

        match self.command {
            Commands::Submit { exam_title, answer } => {
                submit::execute(&session, &exam_title, &answer).await?
            }
            Commands::List => list::execute(&session).await?,
            Commands::Decrypt { submission_id } => {
                decrypt::execute(&session, submission_id).await?
            }
        }

        Ok(())
    }
}
