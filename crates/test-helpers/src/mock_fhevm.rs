// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, Bytes, Signature};
use async_trait::async_trait;
use eyre::{bail, eyre, Result};
use rand::RngCore;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use ev_fhevm::{
    DecryptionSignature, EncryptedInput, FhevmInstance, Handle, HandleContractPair, Keypair,
};

#[derive(Debug, Clone, Copy)]
struct CiphertextRecord {
    value: u64,
    contract_address: Address,
    user_address: Address,
}

/// In-process stand-in for the FHEVM coprocessor. Handles are deterministic
/// digests over (contract, user, value, nonce); `user_decrypt` enforces the
/// credential the way the real capability does: the signature must recover to
/// the user, the contract set must match what was signed, and the validity
/// window must cover now.
#[derive(Clone, Default)]
pub struct MockFhevm {
    ciphertexts: Arc<RwLock<HashMap<Handle, CiphertextRecord>>>,
    nonce: Arc<AtomicU64>,
}

impl MockFhevm {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FhevmInstance for MockFhevm {
    fn generate_keypair(&self) -> Keypair {
        let mut rng = rand::thread_rng();
        let mut private = [0u8; 32];
        let mut public = [0u8; 32];
        rng.fill_bytes(&mut private);
        rng.fill_bytes(&mut public);
        Keypair {
            public_key: format!("0x{}", hex::encode(public)),
            private_key: format!("0x{}", hex::encode(private)),
        }
    }

    async fn encrypt(
        &self,
        contract_address: Address,
        user_address: Address,
        values: &[u64],
    ) -> Result<EncryptedInput> {
        let mut handles = Vec::with_capacity(values.len());
        let mut ciphertexts = self.ciphertexts.write().await;
        for &value in values {
            let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
            let mut preimage = Vec::new();
            preimage.extend_from_slice(contract_address.as_slice());
            preimage.extend_from_slice(user_address.as_slice());
            preimage.extend_from_slice(&value.to_be_bytes());
            preimage.extend_from_slice(&nonce.to_be_bytes());
            let handle: Handle = keccak256(&preimage);
            ciphertexts.insert(
                handle,
                CiphertextRecord {
                    value,
                    contract_address,
                    user_address,
                },
            );
            handles.push(handle);
        }

        let mut proof_preimage = Vec::new();
        for handle in &handles {
            proof_preimage.extend_from_slice(handle.as_slice());
        }
        let input_proof = Bytes::copy_from_slice(keccak256(&proof_preimage).as_slice());

        Ok(EncryptedInput {
            handles,
            input_proof,
        })
    }

    async fn user_decrypt(
        &self,
        pairs: &[HandleContractPair],
        _private_key: &str,
        public_key: &str,
        signature: &str,
        contract_addresses: &[Address],
        user_address: Address,
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<HashMap<Handle, u64>> {
        let payload = DecryptionSignature::signing_payload(
            public_key,
            contract_addresses,
            user_address,
            start_timestamp,
            duration_days,
        );
        let signature =
            Signature::from_str(signature).map_err(|e| eyre!("malformed signature: {e}"))?;
        let recovered = signature.recover_address_from_msg(payload.as_bytes())?;
        if recovered != user_address {
            bail!("signature does not authorize {user_address}");
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let expiry = duration_days
            .checked_mul(86_400)
            .and_then(|window| start_timestamp.checked_add(window));
        match expiry {
            Some(expiry) if now >= start_timestamp && now < expiry => {}
            _ => bail!("decryption signature expired"),
        }

        let ciphertexts = self.ciphertexts.read().await;
        let mut plaintexts = HashMap::new();
        for pair in pairs {
            if !contract_addresses.contains(&pair.contract_address) {
                bail!(
                    "contract {} not covered by the decryption signature",
                    pair.contract_address
                );
            }
            let record = ciphertexts
                .get(&pair.handle)
                .ok_or_else(|| eyre!("unknown handle {}", pair.handle))?;
            if record.contract_address != pair.contract_address
                || record.user_address != user_address
            {
                bail!("handle {} is not decryptable by {user_address}", pair.handle);
            }
            plaintexts.insert(pair.handle, record.value);
        }
        Ok(plaintexts)
    }
}
