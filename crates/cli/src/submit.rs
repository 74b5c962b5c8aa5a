// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::cli::CliSession;
use eyre::Result;

pub async fn execute(session: &CliSession, exam_title: &str, answer: &str) -> Result<()> {
    session.submit(exam_title, answer).await?;
    println!("{}", session.message().await);

    for submission in session.submissions().await {
        println!(
            "#{} {} ({})",
            submission.id, submission.exam_title, submission.timestamp
        );
    }

    Ok(())
}
