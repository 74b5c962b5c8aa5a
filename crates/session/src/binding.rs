// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;

/// The (chain, account, contract) tuple a session currently operates under.
/// Operations capture this by value at their start; any divergence observed
/// at a later checkpoint means the result belongs to a context the session no
/// longer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBinding {
    pub chain_id: u64,
    pub account: Address,
    pub contract_address: Address,
}

impl SessionBinding {
    /// Refresh results only need the chain and contract to agree; the
    /// submission list is re-fetched per account anyway.
    pub fn same_contract(&self, other: &SessionBinding) -> bool {
        self.chain_id == other.chain_id && self.contract_address == other.contract_address
    }
}
