// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::instance::FhevmInstance;
use crate::signer::{SignerError, WalletSigner};
use crate::storage::GenericStringStorage;

/// Validity window granted when a fresh credential is signed.
pub const DEFAULT_DURATION_DAYS: u64 = 365;

const STORAGE_PREFIX: &str = "fhevm:decryption-signature";

/// A time-bounded, contract-scoped decryption credential: an ephemeral
/// keypair plus the account's signature binding it to an exact contract set
/// and validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionSignature {
    pub public_key: String,
    pub private_key: String,
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl DecryptionSignature {
    /// Sorted copy of a contract set. The signed set and the later decryption
    /// call must agree on order and checksum formatting.
    pub fn normalize(contract_addresses: &[Address]) -> Vec<Address> {
        let mut sorted = contract_addresses.to_vec();
        sorted.sort();
        sorted.dedup();
        sorted
    }

    /// Cache key for a (user, contract-set) pair.
    pub fn storage_key(user_address: Address, contract_addresses: &[Address]) -> String {
        let contracts = Self::normalize(contract_addresses)
            .iter()
            .map(|a| a.to_checksum(None))
            .collect::<Vec<_>>()
            .join("+");
        format!(
            "{STORAGE_PREFIX}:{}:{contracts}",
            user_address.to_checksum(None)
        )
    }

    /// The canonical message the account signs. Every field that scopes the
    /// credential is bound here, checksum formatted.
    pub fn signing_payload(
        public_key: &str,
        contract_addresses: &[Address],
        user_address: Address,
        start_timestamp: u64,
        duration_days: u64,
    ) -> String {
        let contracts = contract_addresses
            .iter()
            .map(|a| a.to_checksum(None))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "FHEVM user decryption authorization\n\
             publicKey: {public_key}\n\
             contracts: {contracts}\n\
             user: {}\n\
             startTimestamp: {start_timestamp}\n\
             durationDays: {duration_days}",
            user_address.to_checksum(None)
        )
    }

    /// Cached credentials come from an untrusted store; an overflowing
    /// validity window counts as invalid rather than panicking.
    pub fn is_valid(&self) -> bool {
        self.duration_days
            .checked_mul(86_400)
            .and_then(|window| self.start_timestamp.checked_add(window))
            .map(|expiry| unix_now() < expiry)
            .unwrap_or(false)
    }

    /// True when this credential was issued to `user_address` for exactly
    /// `contract_addresses` (already normalized).
    pub fn matches(&self, user_address: Address, contract_addresses: &[Address]) -> bool {
        self.user_address == user_address && self.contract_addresses == contract_addresses
    }

    /// Returns a cached credential for (signer, contract set) when one is
    /// valid, otherwise derives a fresh keypair, asks the account to sign the
    /// canonical payload and persists the result.
    ///
    /// Returns `None` when the user declines to sign or a capability fails;
    /// callers treat that as "cannot decrypt now", never as fatal.
    pub async fn load_or_sign<I, W, S>(
        instance: &I,
        contract_addresses: &[Address],
        signer: &W,
        storage: &S,
    ) -> Option<DecryptionSignature>
    where
        I: FhevmInstance,
        W: WalletSigner + ?Sized,
        S: GenericStringStorage + ?Sized,
    {
        let user_address = signer.address();
        let sorted = Self::normalize(contract_addresses);
        let key = Self::storage_key(user_address, &sorted);

        match storage.get_item(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<DecryptionSignature>(&json) {
                Ok(sig) if sig.is_valid() && sig.matches(user_address, &sorted) => {
                    debug!(user = %user_address, "reusing cached decryption signature");
                    return Some(sig);
                }
                Ok(_) => debug!(user = %user_address, "cached decryption signature expired"),
                Err(e) => warn!("discarding unparseable cached decryption signature: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("decryption signature storage unavailable: {e}"),
        }

        let keypair = instance.generate_keypair();
        let start_timestamp = unix_now();
        let duration_days = DEFAULT_DURATION_DAYS;
        let payload = Self::signing_payload(
            &keypair.public_key,
            &sorted,
            user_address,
            start_timestamp,
            duration_days,
        );

        let signature = match signer.sign_message(payload.as_bytes()).await {
            Ok(sig) => format!("0x{}", hex::encode(sig.as_bytes())),
            Err(SignerError::Declined) => {
                warn!(user = %user_address, "user declined decryption signature request");
                return None;
            }
            Err(e) => {
                warn!("decryption signature request failed: {e}");
                return None;
            }
        };

        let sig = DecryptionSignature {
            public_key: keypair.public_key,
            private_key: keypair.private_key,
            signature,
            contract_addresses: sorted,
            user_address,
            start_timestamp,
            duration_days,
        };

        match serde_json::to_string(&sig) {
            Ok(json) => {
                if let Err(e) = storage.set_item(&key, &json).await {
                    warn!("failed to persist decryption signature: {e}");
                }
            }
            Err(e) => warn!("failed to serialize decryption signature: {e}"),
        }

        Some(sig)
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const USER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const C1: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    const C2: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

    #[test]
    fn storage_key_is_order_insensitive() {
        let a = DecryptionSignature::storage_key(USER, &[C1, C2]);
        let b = DecryptionSignature::storage_key(USER, &[C2, C1]);
        assert_eq!(a, b);
    }

    #[test]
    fn storage_key_differs_per_contract_set() {
        let a = DecryptionSignature::storage_key(USER, &[C1]);
        let b = DecryptionSignature::storage_key(USER, &[C1, C2]);
        assert_ne!(a, b);
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        assert_eq!(
            DecryptionSignature::normalize(&[C2, C1, C2]),
            DecryptionSignature::normalize(&[C1, C2])
        );
    }

    #[test]
    fn expired_signature_is_invalid() {
        let sig = DecryptionSignature {
            public_key: "0x01".into(),
            private_key: "0x02".into(),
            signature: "0x03".into(),
            contract_addresses: vec![C1],
            user_address: USER,
            start_timestamp: unix_now() - 2 * 86_400,
            duration_days: 1,
        };
        assert!(!sig.is_valid());

        let fresh = DecryptionSignature {
            start_timestamp: unix_now(),
            duration_days: DEFAULT_DURATION_DAYS,
            ..sig
        };
        assert!(fresh.is_valid());
    }

    #[test]
    fn overflowing_window_is_invalid() {
        let sig = DecryptionSignature {
            public_key: "0x01".into(),
            private_key: "0x02".into(),
            signature: "0x03".into(),
            contract_addresses: vec![C1],
            user_address: USER,
            start_timestamp: unix_now(),
            duration_days: u64::MAX,
        };
        assert!(!sig.is_valid());

        let saturated_start = DecryptionSignature {
            start_timestamp: u64::MAX,
            duration_days: 1,
            ..sig
        };
        assert!(!saturated_start.is_valid());
    }

    #[test]
    fn payload_binds_checksummed_addresses() {
        let payload = DecryptionSignature::signing_payload("0xabc", &[C1], USER, 1_000, 365);
        assert!(payload.contains(&C1.to_checksum(None)));
        assert!(payload.contains(&USER.to_checksum(None)));
        assert!(payload.contains("durationDays: 365"));
    }
}
