// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Errors surfaced by the ExamVault ledger, split so callers can tell a
/// user-declined transaction apart from a revert or a transport failure.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("transaction declined by signer")]
    Declined,
    #[error("ledger rejected the call: {0}")]
    Reverted(String),
    #[error(transparent)]
    Transport(#[from] eyre::Report),
}

impl LedgerError {
    pub(crate) fn from_contract(e: alloy::contract::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("revert") {
            LedgerError::Reverted(msg)
        } else {
            LedgerError::Transport(eyre::Report::new(e))
        }
    }
}
