// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::cli::CliSession;
use eyre::Result;

pub async fn execute(session: &CliSession) -> Result<()> {
    session.refresh().await?;

    let submissions = session.submissions().await;
    if submissions.is_empty() {
        println!("No submissions for this wallet.");
        return Ok(());
    }
    for submission in submissions {
        println!(
            "#{} {} ({})",
            submission.id, submission.exam_title, submission.timestamp
        );
    }

    Ok(())
}
