// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use ev_evm_helpers::LedgerError;
use thiserror::Error;

/// Failure modes of a single session operation. Every variant is scoped to
/// that invocation; nothing here is fatal to the session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("ExamVault deployment not found for the current chain")]
    NotDeployed,
    #[error("FHEVM instance is not ready")]
    InstanceNotReady,
    #[error("no account connected")]
    NoAccount,
    #[error("exam title must not be empty")]
    EmptyTitle,
    #[error("answer must not be empty")]
    EmptyAnswer,
    #[error("cancelled: session context changed mid-operation")]
    Cancelled,
    #[error("cancelled by user")]
    Declined,
    #[error("unable to build decryption authorization")]
    NoDecryptionSignature,
    #[error("ledger failure: {0}")]
    Ledger(LedgerError),
    #[error("capability failure: {0}")]
    Capability(#[from] eyre::Report),
}

impl From<LedgerError> for SessionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Declined => SessionError::Declined,
            other => SessionError::Ledger(other),
        }
    }
}
