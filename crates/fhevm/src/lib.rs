// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod decryption_signature;
pub mod instance;
pub mod relayer;
pub mod signer;
pub mod storage;
pub mod types;

pub use decryption_signature::DecryptionSignature;
pub use instance::{EncryptedInputBuilder, FhevmInstance};
pub use relayer::RelayerClient;
pub use signer::{SignerError, WalletSigner};
pub use storage::{GenericStringStorage, InMemoryStorage};
pub use types::{EncryptedInput, Handle, HandleContractPair, Keypair};
