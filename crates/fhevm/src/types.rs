// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes, FixedBytes};

/// Opaque reference to an encrypted value, meaningful only to the FHEVM
/// coprocessor and the ledger contract.
pub type Handle = FixedBytes<32>;

/// Result of encrypting one or more values against a (contract, user) pair.
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    pub handles: Vec<Handle>,
    pub input_proof: Bytes,
}

/// Ephemeral keypair for the user-decryption protocol, hex encoded.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub public_key: String,
    pub private_key: String,
}

/// A ciphertext handle together with the contract it is scoped to.
#[derive(Debug, Clone, Copy)]
pub struct HandleContractPair {
    pub handle: Handle,
    pub contract_address: Address,
}
