// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use ev_fhevm::GenericStringStorage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const ANSWER_STORAGE_KEY: &str = "examvault_answers";

/// Submission timestamps are assigned by the ledger, while cache entries are
/// keyed with the local clock at submit time. The fuzzy window bridges the
/// gap between the two.
const TIMESTAMP_TOLERANCE_SECS: u64 = 60;

/// Best-effort local cache of original answer texts, keyed
/// `"<title>_<timestampSeconds>"`. Non-authoritative by construction: every
/// failure is swallowed and a miss is a normal outcome, never an error.
#[derive(Clone)]
pub struct AnswerCache<S> {
    storage: Arc<S>,
}

impl<S: GenericStringStorage> AnswerCache<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn load(&self) -> HashMap<String, String> {
        match self.storage.get_item(ANSWER_STORAGE_KEY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_default(),
            Ok(None) => HashMap::new(),
            Err(e) => {
                debug!("answer cache unavailable: {e}");
                HashMap::new()
            }
        }
    }

    /// Record the original answer text before submission.
    pub async fn save(&self, exam_title: &str, answer_text: &str, timestamp: u64) {
        let mut answers = self.load().await;
        answers.insert(format!("{exam_title}_{timestamp}"), answer_text.to_string());
        match serde_json::to_string(&answers) {
            Ok(json) => {
                if let Err(e) = self.storage.set_item(ANSWER_STORAGE_KEY, &json).await {
                    debug!("failed to cache answer locally: {e}");
                }
            }
            Err(e) => debug!("failed to serialize answer cache: {e}"),
        }
    }

    /// Look up an original answer by exam title and the ledger-assigned
    /// timestamp, tolerating the save/confirmation clock skew.
    pub async fn lookup(&self, exam_title: &str, timestamp: u64) -> Option<String> {
        let answers = self.load().await;
        for (key, answer) in answers {
            let Some((title, ts)) = key.rsplit_once('_') else {
                continue;
            };
            let Ok(ts) = ts.parse::<u64>() else {
                continue;
            };
            if title == exam_title && timestamp.abs_diff(ts) < TIMESTAMP_TOLERANCE_SECS {
                return Some(answer);
            }
        }
        debug!(title = exam_title, timestamp, "no locally cached answer");
        None
    }
}
