// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes, FixedBytes};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::instance::FhevmInstance;
use crate::types::{EncryptedInput, Handle, HandleContractPair, Keypair};

/// HTTP client for an FHEVM relayer. Encryption and user decryption are
/// performed by the relayer service; values on the wire are decimal strings
/// and byte payloads are 0x-prefixed hex.
#[derive(Clone)]
pub struct RelayerClient {
    http: reqwest::Client,
    relayer_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InputProofRequest {
    contract_address: String,
    user_address: String,
    values: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputProofResponse {
    handles: Vec<String>,
    input_proof: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HandlePair {
    handle: String,
    contract_address: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDecryptRequest {
    handle_contract_pairs: Vec<HandlePair>,
    private_key: String,
    public_key: String,
    signature: String,
    contract_addresses: Vec<String>,
    user_address: String,
    start_timestamp: u64,
    duration_days: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDecryptResponse {
    plaintexts: HashMap<String, String>,
}

impl RelayerClient {
    pub fn new(relayer_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            relayer_url: relayer_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.relayer_url)
    }
}

#[async_trait]
impl FhevmInstance for RelayerClient {
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
        let request = InputProofRequest {
            contract_address: contract_address.to_checksum(None),
            user_address: user_address.to_checksum(None),
            values: values.iter().map(|v| v.to_string()).collect(),
        };

        debug!(contract = %contract_address, count = values.len(), "requesting input proof");
        let response: InputProofResponse = self
            .http
            .post(self.endpoint("input-proof"))
            .json(&request)
            .send()
            .await
            .wrap_err("relayer unreachable")?
            .error_for_status()
            .wrap_err("relayer rejected input-proof request")?
            .json()
            .await
            .wrap_err("malformed input-proof response")?;

        let handles = response
            .handles
            .iter()
            .map(|h| FixedBytes::from_str(h).wrap_err("malformed handle"))
            .collect::<Result<Vec<Handle>>>()?;
        let input_proof =
            Bytes::from_str(&response.input_proof).wrap_err("malformed input proof")?;

        Ok(EncryptedInput {
            handles,
            input_proof,
        })
    }

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
    ) -> Result<HashMap<Handle, u64>> {
        let request = UserDecryptRequest {
            handle_contract_pairs: pairs
                .iter()
                .map(|p| HandlePair {
                    handle: p.handle.to_string(),
                    contract_address: p.contract_address.to_checksum(None),
                })
                .collect(),
            private_key: private_key.to_string(),
            public_key: public_key.to_string(),
            signature: signature.to_string(),
            contract_addresses: contract_addresses
                .iter()
                .map(|a| a.to_checksum(None))
                .collect(),
            user_address: user_address.to_checksum(None),
            start_timestamp,
            duration_days,
        };

        debug!(user = %user_address, count = pairs.len(), "requesting user decryption");
        let response: UserDecryptResponse = self
            .http
            .post(self.endpoint("user-decrypt"))
            .json(&request)
            .send()
            .await
            .wrap_err("relayer unreachable")?
            .error_for_status()
            .wrap_err("relayer rejected user-decrypt request")?
            .json()
            .await
            .wrap_err("malformed user-decrypt response")?;

        let mut plaintexts = HashMap::new();
        for (handle, value) in response.plaintexts {
            let handle = FixedBytes::from_str(&handle).wrap_err("malformed handle")?;
            let value = value
                .parse::<u64>()
                .map_err(|_| eyre!("plaintext out of u64 range: {value}"))?;
            plaintexts.insert(handle, value);
        }
        Ok(plaintexts)
    }
}
