// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Signature};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ev_fhevm::{SignerError, WalletSigner};

/// Wraps a signer to count signature requests and optionally decline them,
/// standing in for the user's wallet prompt.
pub struct CountingSigner<W> {
    inner: W,
    sign_requests: AtomicUsize,
    decline: AtomicBool,
}

impl<W: WalletSigner> CountingSigner<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            sign_requests: AtomicUsize::new(0),
            decline: AtomicBool::new(false),
        }
    }

    /// Number of signature prompts the user has seen, declined included.
    pub fn sign_requests(&self) -> usize {
        self.sign_requests.load(Ordering::SeqCst)
    }

    pub fn set_decline(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }
}

#[async_trait]
impl<W: WalletSigner> WalletSigner for CountingSigner<W> {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        self.sign_requests.fetch_add(1, Ordering::SeqCst);
        if self.decline.load(Ordering::SeqCst) {
            return Err(SignerError::Declined);
        }
        self.inner.sign_message(message).await
    }
}
