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

//! Reading sessions back from storage.
//!
//! Stored data may come from older versions or be partially corrupt. Nothing
//! here fails: unusable data reads as "no session", and repairable data is
//! repaired.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::bank::ALL;
use crate::config::Config;
use crate::config::MAX_DURATION_SEC;
use crate::session::CompletionReason;
use crate::session::Session;
use crate::session::derive_scored_ids;
use crate::types::answer::Answer;
use crate::types::mode::Mode;
use crate::types::timestamp::Timestamp;

/// A session as stored, with every field optional and untyped.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    mode: Option<Value>,
    domain_id: Option<Value>,
    section: Option<Value>,
    seed: Option<Value>,
    question_ids: Option<Value>,
    answers: Option<Value>,
    flagged_questions: Option<Value>,
    current_index: Option<Value>,
    scored_ids: Option<Value>,
    started_at_ms: Option<Value>,
    duration_sec: Option<Value>,
    completed: Option<Value>,
    created_at_ms: Option<Value>,
    completed_at_ms: Option<Value>,
    completion_reason: Option<Value>,
}

/// Turn stored bytes into a usable session, or `None` if they cannot be one.
pub fn normalize_for_runtime(bytes: &[u8], config: &Config) -> Option<Session> {
    let raw: RawSession = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Discarding unreadable stored session: {e}");
            return None;
        }
    };

    let seed = match raw.seed.as_ref().and_then(Value::as_str) {
        Some(seed) if !seed.is_empty() => seed.to_string(),
        _ => {
            log::warn!("Discarding stored session without a seed.");
            return None;
        }
    };

    let question_ids = match raw.question_ids.as_ref().and_then(string_list) {
        Some(ids) if !ids.is_empty() && is_unique(&ids) => ids,
        _ => {
            log::warn!("Discarding stored session with invalid question IDs.");
            return None;
        }
    };
    let in_session = |id: &str| question_ids.iter().any(|q| q == id);

    let mode = raw
        .mode
        .as_ref()
        .and_then(Value::as_str)
        .map(Mode::normalize)
        .unwrap_or(Mode::Review);

    let filter_value = |value: Option<&Value>| match (mode, value.and_then(Value::as_str)) {
        (Mode::Review, Some(v)) if !v.is_empty() => v.to_string(),
        _ => ALL.to_string(),
    };
    let domain_id = filter_value(raw.domain_id.as_ref());
    let section = filter_value(raw.section.as_ref());

    let mut answers: BTreeMap<String, Answer> = BTreeMap::new();
    if let Some(Value::Object(map)) = raw.answers {
        for (id, value) in map {
            if !in_session(&id) {
                continue;
            }
            match serde_json::from_value::<Answer>(value) {
                Ok(answer) => {
                    answers.insert(id, answer);
                }
                Err(_) => {
                    log::warn!("Dropping unreadable stored answer for {id}.");
                }
            }
        }
    }

    let flagged_questions: BTreeSet<String> = raw
        .flagged_questions
        .as_ref()
        .and_then(string_list)
        .unwrap_or_default()
        .into_iter()
        .filter(|id| in_session(id))
        .collect();

    let last_index = question_ids.len() - 1;
    let current_index = raw
        .current_index
        .as_ref()
        .and_then(Value::as_u64)
        .map(|i| (i as usize).min(last_index))
        .unwrap_or(0);

    let started_at = raw.started_at_ms.as_ref().and_then(timestamp);
    let duration_sec = raw
        .duration_sec
        .as_ref()
        .and_then(Value::as_i64)
        .filter(|d| *d > 0 && *d <= MAX_DURATION_SEC);

    let (started_at, duration_sec, scored_ids) = match mode {
        Mode::Review => (None, None, BTreeSet::new()),
        Mode::Timed => {
            let Some(started_at) = started_at else {
                log::warn!("Discarding stored timed session without a start time.");
                return None;
            };
            let duration_sec = duration_sec.unwrap_or(config.duration_sec);
            let stored = raw
                .scored_ids
                .as_ref()
                .and_then(string_list)
                .filter(|ids| !ids.is_empty() && ids.iter().all(|id| in_session(id)));
            let scored_ids = match stored {
                Some(ids) => ids.into_iter().collect(),
                None => {
                    log::warn!("Re-deriving scored IDs for session {seed}.");
                    derive_scored_ids(&question_ids, &seed, config.scored_count)
                }
            };
            (Some(started_at), Some(duration_sec), scored_ids)
        }
    };

    let completed = raw
        .completed
        .as_ref()
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let created_at = raw
        .created_at_ms
        .as_ref()
        .and_then(timestamp)
        .or(started_at)
        .or_else(|| Timestamp::from_millis(0))?;
    let completed_at = raw.completed_at_ms.as_ref().and_then(timestamp);
    let completion_reason = raw
        .completion_reason
        .and_then(|v| serde_json::from_value::<CompletionReason>(v).ok());

    Some(Session {
        mode,
        domain_id,
        section,
        seed,
        question_ids,
        answers,
        flagged_questions,
        current_index,
        scored_ids,
        started_at,
        duration_sec,
        completed,
        created_at,
        completed_at,
        completion_reason,
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

fn is_unique(ids: &[String]) -> bool {
    let set: BTreeSet<&String> = ids.iter().collect();
    set.len() == ids.len()
}

/// Milliseconds since the epoch. Accepts floats, which older stores wrote.
fn timestamp(value: &Value) -> Option<Timestamp> {
    let ms = match value.as_i64() {
        Some(ms) => ms,
        None => value.as_f64().filter(|f| f.is_finite())? as i64,
    };
    Timestamp::from_millis(ms)
}
