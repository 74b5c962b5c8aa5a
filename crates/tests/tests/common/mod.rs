#![allow(dead_code)]
// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{address, Address};
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;

use ev_fhevm::{InMemoryStorage, WalletSigner};
use ev_session::{SessionBinding, VaultSession};
use ev_test_helpers::{CountingSigner, MockFhevm, MockLedger};

pub const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const CHAIN_ID: u64 = 31337;

pub type TestSession =
    VaultSession<MockLedger, MockFhevm, CountingSigner<PrivateKeySigner>, InMemoryStorage>;

pub struct Harness {
    pub session: Arc<TestSession>,
    pub ledger: Arc<MockLedger>,
    pub fhevm: Arc<MockFhevm>,
    pub signer: Arc<CountingSigner<PrivateKeySigner>>,
    pub storage: Arc<InMemoryStorage>,
    pub account: Address,
}

pub fn binding_for(account: Address) -> SessionBinding {
    SessionBinding {
        chain_id: CHAIN_ID,
        account,
        contract_address: CONTRACT,
    }
}

/// A fresh user with their own ledger deployment and FHEVM instance.
pub fn harness() -> Harness {
    let wallet = PrivateKeySigner::random();
    let account = WalletSigner::address(&wallet);
    let signer = Arc::new(CountingSigner::new(wallet));
    let ledger = Arc::new(MockLedger::new(account));
    let fhevm = Arc::new(MockFhevm::new());
    let storage = Arc::new(InMemoryStorage::new());
    let session = Arc::new(
        VaultSession::new(binding_for(account), storage.clone())
            .with_ledger(ledger.clone())
            .with_instance(fhevm.clone())
            .with_signer(signer.clone()),
    );
    Harness {
        session,
        ledger,
        fhevm,
        signer,
        storage,
        account,
    }
}

/// A second user connected to the same ledger and FHEVM instance.
pub fn connect_user(existing: &Harness) -> Harness {
    let wallet = PrivateKeySigner::random();
    let account = WalletSigner::address(&wallet);
    let signer = Arc::new(CountingSigner::new(wallet));
    let ledger = Arc::new(existing.ledger.connect(account));
    let storage = Arc::new(InMemoryStorage::new());
    let session = Arc::new(
        VaultSession::new(binding_for(account), storage.clone())
            .with_ledger(ledger.clone())
            .with_instance(existing.fhevm.clone())
            .with_signer(signer.clone()),
    );
    Harness {
        session,
        ledger,
        fhevm: existing.fhevm.clone(),
        signer,
        storage,
        account,
    }
}
