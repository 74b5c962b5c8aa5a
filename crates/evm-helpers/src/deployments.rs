// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{address, Address};

/// Resolves the ExamVault deployment for a chain id. `None` means no known
/// deployment; callers surface that as a precondition failure rather than
/// attempting a call.
pub fn examvault_address(chain_id: u64) -> Option<Address> {
    match chain_id {
        // Local hardhat node, first deterministic deployment
        31337 => Some(address!("5FbDB2315678afecb367f032d93F642f64180aa3")),
        _ => None,
    }
}
