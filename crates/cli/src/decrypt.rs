// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::cli::CliSession;
use eyre::{eyre, Result};

pub async fn execute(session: &CliSession, submission_id: u64) -> Result<()> {
    let decrypted = session
        .decrypt_with_original(submission_id)
        .await?
        .ok_or_else(|| eyre!("decryption superseded before it could complete"))?;

    println!("#{} {}", decrypted.id, decrypted.exam_title);
    println!("fingerprint: {}", decrypted.value);
    match decrypted.original_answer {
        Some(text) => println!("answer: {}", text),
        None => println!("answer: (not cached on this machine)"),
    }

    Ok(())
}
