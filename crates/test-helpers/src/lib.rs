// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod mock_fhevm;
pub mod mock_ledger;
pub mod signers;

pub use mock_fhevm::MockFhevm;
pub use mock_ledger::MockLedger;
pub use signers::CountingSigner;
