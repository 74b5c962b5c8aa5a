// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, U256};

/// Deterministic 64-bit fingerprint of an answer text. This surrogate is the
/// only value ever encrypted on-chain: decryption recovers a verifiable
/// fingerprint of the submission, not the original text.
pub fn answer_surrogate(answer_text: &str) -> u64 {
    let digest = keccak256(answer_text.as_bytes());
    let wide = U256::from_be_bytes(digest.0);
    // Reduced below 2^63 so the value stays comfortably inside euint64
    (wide % (U256::from(1u8) << 63usize)).to::<u64>()
}
