// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::Result;
use std::collections::HashMap;

use crate::types::{EncryptedInput, Handle, HandleContractPair, Keypair};

/// The FHEVM coprocessor capability: building encrypted inputs bound to a
/// (contract, user) pair and decrypting handles under a previously signed
/// decryption credential.
#[async_trait]
pub trait FhevmInstance: Send + Sync {
    /// Generate an ephemeral keypair for the user-decryption protocol.
    fn generate_keypair(&self) -> Keypair;

    /// Encrypt `values` for `contract_address`/`user_address`, yielding one
    /// handle per value plus a single validity proof. Prefer
    /// [`FhevmInstance::create_encrypted_input`].
    async fn encrypt(
        &self,
        contract_address: Address,
        user_address: Address,
        values: &[u64],
    ) -> Result<EncryptedInput>;

    /// Decrypt handles under the given credential. The contract addresses
    /// must be checksum-identical to the set the credential was signed for,
    /// or the capability rejects the request.
    #[allow(clippy::too_many_arguments)]
    async fn user_decrypt(
        &self,
        pairs: &[HandleContractPair],
        private_key: &str,
        public_key: &str,
        signature: &str,
        contract_addresses: &[Address],
        user_address: Address,
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<HashMap<Handle, u64>>;

    /// Start building an encrypted input for a (contract, user) pair.
    fn create_encrypted_input(
        &self,
        contract_address: Address,
        user_address: Address,
    ) -> EncryptedInputBuilder<'_, Self>
    where
        Self: Sized,
    {
        EncryptedInputBuilder {
            instance: self,
            contract_address,
            user_address,
            values: Vec::new(),
        }
    }
}

/// Builder mirroring the coprocessor input API:
/// `create_encrypted_input(contract, user).add64(v).encrypt()`.
pub struct EncryptedInputBuilder<'a, I: FhevmInstance> {
    instance: &'a I,
    contract_address: Address,
    user_address: Address,
    values: Vec<u64>,
}

impl<I: FhevmInstance> EncryptedInputBuilder<'_, I> {
    pub fn add64(mut self, value: u64) -> Self {
        self.values.push(value);
        self
    }

    pub async fn encrypt(self) -> Result<EncryptedInput> {
        self.instance
            .encrypt(self.contract_address, self.user_address, &self.values)
            .await
    }
}
