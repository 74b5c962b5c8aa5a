// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod contracts;
pub mod deployments;
pub mod error;

pub use contracts::{
    ExamVaultContract, ExamVaultContractFactory, ExamVaultRead, ExamVaultReadContract,
    ExamVaultWrite, ExamVaultWriteContract, ProviderType, ReadOnly, ReadWrite, SubmissionRecord,
    TxOutcome,
};
pub use error::LedgerError;
