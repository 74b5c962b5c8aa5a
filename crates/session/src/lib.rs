// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod answer_cache;
pub mod binding;
pub mod error;
pub mod session;
pub mod state;
pub mod surrogate;

pub use answer_cache::AnswerCache;
pub use binding::SessionBinding;
pub use error::SessionError;
pub use session::VaultSession;
pub use state::{DecryptedAnswer, Submission};
pub use surrogate::answer_surrogate;
