// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Signature};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("signature request declined by user")]
    Declined,
    #[error(transparent)]
    Other(#[from] eyre::Report),
}

/// The user's account: an address plus the ability to sign arbitrary
/// messages (EIP-191). A declined request is distinguished from a failure so
/// callers can report "cancelled" instead of an error.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError>;
}

#[async_trait]
impl WalletSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        alloy::signers::Signer::sign_message(self, message)
            .await
            .map_err(|e| SignerError::Other(eyre::Report::new(e)))
    }
}
