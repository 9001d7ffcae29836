// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::session::CompletionReason;
use crate::session::Session;
use crate::session::score::ScoreResult;
use crate::store::HISTORY_KEY;
use crate::store::Store;
use crate::types::mode::Mode;
use crate::types::timestamp::Timestamp;

/// A record of one completed session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub session_key: String,
    pub mode: Mode,
    pub domain_id: String,
    pub section: String,
    pub seed: String,
    #[serde(rename = "createdAtMs")]
    pub created_at: Timestamp,
    #[serde(rename = "completedAtMs")]
    pub completed_at: Timestamp,
    pub reason: CompletionReason,
    pub score: ScoreResult,
}

impl HistoryEntry {
    pub fn new(session: &Session, score: ScoreResult, now: Timestamp) -> Self {
        Self {
            session_key: session.key(),
            mode: session.mode(),
            domain_id: session.domain_id().to_string(),
            section: session.section().to_string(),
            seed: session.seed().to_string(),
            created_at: session.created_at(),
            completed_at: session.completed_at().unwrap_or(now),
            reason: session
                .completion_reason()
                .unwrap_or(CompletionReason::Submitted),
            score,
        }
    }
}

/// Read the history log, oldest first. Unreadable data reads as empty.
pub fn load_history(store: &dyn Store) -> Fallible<Vec<HistoryEntry>> {
    let Some(bytes) = store.get(HISTORY_KEY)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            log::warn!("Discarding unreadable history: {e}");
            Ok(Vec::new())
        }
    }
}

/// Append an entry, keeping at most `limit` of the most recent ones.
pub fn record(store: &dyn Store, entry: HistoryEntry, limit: usize) -> Fallible<()> {
    let mut entries = load_history(store)?;
    entries.push(entry);
    if entries.len() > limit {
        let excess = entries.len() - limit;
        entries.drain(..excess);
    }
    let bytes = serde_json::to_vec(&entries)?;
    store.set(HISTORY_KEY, &bytes)?;
    log::debug!("History has {} entries.", entries.len());
    Ok(())
}
