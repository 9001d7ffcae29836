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

pub mod normalize;
pub mod pause;
pub mod runtime;
pub mod score;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::bank::ALL;
use crate::rng::pick_subset;
use crate::session::pause::PauseState;
use crate::types::answer::Answer;
use crate::types::mode::Mode;
use crate::types::question::Question;
use crate::types::timestamp::Timestamp;

/// What the user asked for when starting a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Filters {
    mode: Mode,
    domain_id: String,
    section: String,
}

impl Filters {
    /// Normalize raw filter values. Unknown modes become review, empty
    /// filters become [`ALL`], and timed sessions ignore the filters.
    pub fn new(mode: &str, domain_id: &str, section: &str) -> Self {
        let mode = Mode::normalize(mode);
        let normalize = |value: &str| {
            let value = value.trim();
            if mode == Mode::Timed || value.is_empty() {
                ALL.to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            mode,
            domain_id: normalize(domain_id),
            section: normalize(section),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Sessions with equal keys resume each other.
    pub fn session_key(&self) -> String {
        session_key(self.mode, &self.domain_id, &self.section)
    }
}

fn session_key(mode: Mode, domain_id: &str, section: &str) -> String {
    match mode {
        Mode::Timed => "timed".to_string(),
        Mode::Review => format!("review::{domain_id}::{section}"),
    }
}

/// The scored subset of a timed session. A pure function of the session's
/// immutable fields, so it can always be recomputed.
pub fn derive_scored_ids(question_ids: &[String], seed: &str, count: usize) -> BTreeSet<String> {
    pick_subset(question_ids, count, &format!("{seed}::scored"))
        .into_iter()
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    /// The user submitted the session.
    Submitted,
    /// The timer ran out.
    Expired,
}

/// A quiz session. Fields are only changed through the mutators below,
/// which enforce the session's invariants.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    mode: Mode,
    domain_id: String,
    section: String,
    /// Source of all randomness in this session.
    seed: String,
    /// Presentation order.
    question_ids: Vec<String>,
    answers: BTreeMap<String, Answer>,
    flagged_questions: BTreeSet<String>,
    current_index: usize,
    /// Questions that count toward a timed exam's score. Empty in review.
    scored_ids: BTreeSet<String>,
    #[serde(rename = "startedAtMs", skip_serializing_if = "Option::is_none")]
    started_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_sec: Option<i64>,
    completed: bool,
    #[serde(rename = "createdAtMs")]
    created_at: Timestamp,
    #[serde(rename = "completedAtMs", skip_serializing_if = "Option::is_none")]
    completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_reason: Option<CompletionReason>,
}

impl Session {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn key(&self) -> String {
        session_key(self.mode, &self.domain_id, &self.section)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn question_ids(&self) -> &[String] {
        &self.question_ids
    }

    pub fn len(&self) -> usize {
        self.question_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    pub fn flagged_questions(&self) -> &BTreeSet<String> {
        &self.flagged_questions
    }

    pub fn scored_ids(&self) -> &BTreeSet<String> {
        &self.scored_ids
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question_id(&self) -> Option<&str> {
        self.question_ids.get(self.current_index).map(|s| s.as_str())
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn duration_sec(&self) -> Option<i64> {
        self.duration_sec
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.completion_reason
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn is_flagged(&self, question_id: &str) -> bool {
        self.flagged_questions.contains(question_id)
    }

    pub fn is_scored(&self, question_id: &str) -> bool {
        self.scored_ids.contains(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    fn contains(&self, question_id: &str) -> bool {
        self.question_ids.iter().any(|id| id == question_id)
    }

    /// Seconds left on a timed session's clock, floored at zero. `None` in
    /// review mode. While paused, the frozen value.
    pub fn remaining_seconds(&self, now: Timestamp, pause: Option<&PauseState>) -> Option<i64> {
        let (started_at, duration_sec) = match (self.started_at, self.duration_sec) {
            (Some(started_at), Some(duration_sec)) => (started_at, duration_sec),
            _ => return None,
        };
        if let Some(pause) = pause {
            return Some(pause.frozen_time().max(0));
        }
        let elapsed_sec = now.millis_since(started_at).div_euclid(1000);
        Some(duration_sec.saturating_sub(elapsed_sec).max(0))
    }

    /// Whether a running timed session has run out of time.
    pub fn is_expired(&self, now: Timestamp, pause: Option<&PauseState>) -> bool {
        !self.completed && self.remaining_seconds(now, pause) == Some(0)
    }

    /// Record an answer, replacing any earlier one. No-op if the session is
    /// completed, the question is not in this session, or the answer names
    /// a choice the question does not have.
    pub fn select_answer(&mut self, question: &Question, answer: Answer) -> bool {
        if self.completed || !self.contains(&question.id) || !question.accepts(&answer) {
            return false;
        }
        self.answers.insert(question.id.clone(), answer);
        true
    }

    /// Flag or unflag a question. No-op if completed or unknown.
    pub fn toggle_flag(&mut self, question_id: &str) -> bool {
        if self.completed || !self.contains(question_id) {
            return false;
        }
        if !self.flagged_questions.remove(question_id) {
            self.flagged_questions.insert(question_id.to_string());
        }
        true
    }

    /// Move the cursor, clamping to the session's bounds. Allowed after
    /// completion, for reviewing.
    pub fn navigate(&mut self, index: i64) -> bool {
        let last = self.question_ids.len().saturating_sub(1) as i64;
        let index = index.clamp(0, last) as usize;
        let changed = index != self.current_index;
        self.current_index = index;
        changed
    }

    pub fn next_question(&mut self) -> bool {
        self.navigate(self.current_index as i64 + 1)
    }

    pub fn previous_question(&mut self) -> bool {
        self.navigate(self.current_index as i64 - 1)
    }

    /// Freeze the clock. Only for running timed sessions.
    pub fn pause(&self, now: Timestamp) -> Option<PauseState> {
        if self.completed {
            return None;
        }
        let started_at = self.started_at?;
        let duration_sec = self.duration_sec?;
        let elapsed_sec = now.millis_since(started_at).div_euclid(1000);
        Some(PauseState::new(now, duration_sec.saturating_sub(elapsed_sec)))
    }

    /// Restart the clock, excluding the paused interval from the elapsed
    /// time.
    pub fn resume(&mut self, pause: PauseState, now: Timestamp) -> bool {
        if self.completed {
            return false;
        }
        match self.started_at {
            Some(started_at) => {
                let paused_ms = now.millis_since(pause.paused_at()).max(0);
                self.started_at = Some(started_at.plus_millis(paused_ms));
                true
            }
            None => false,
        }
    }

    /// Mark the session completed. Returns false if it already was.
    pub fn complete(&mut self, reason: CompletionReason, now: Timestamp) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now);
        self.completion_reason = Some(reason);
        true
    }
}
