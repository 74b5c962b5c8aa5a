// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// A submission as the session caches it from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    pub student: Address,
    pub exam_title: String,
    pub timestamp: u64,
    pub exists: bool,
}

/// Result of a decrypt that also consulted the local answer cache. `value`
/// is the verified on-chain surrogate; `original_answer` is best-effort and
/// may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedAnswer {
    pub id: u64,
    pub exam_title: String,
    pub value: u64,
    pub original_answer: Option<String>,
}

/// Shared mutable session state. Mutated only by the operation holding the
/// relevant single-flight guard.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub submissions: Vec<Submission>,
    pub message: String,
}
