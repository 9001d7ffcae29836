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

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::bank::QuestionBank;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::history::HistoryEntry;
use crate::history::load_history;
use crate::history::record;
use crate::rng::pick_subset;
use crate::rng::shuffle;
use crate::session::CompletionReason;
use crate::session::Filters;
use crate::session::Session;
use crate::session::derive_scored_ids;
use crate::session::normalize::normalize_for_runtime;
use crate::session::pause::PauseState;
use crate::session::score::ScoreResult;
use crate::session::score::compute_score;
use crate::store::SESSION_KEY;
use crate::store::Store;
use crate::types::answer::Answer;
use crate::types::mode::Mode;
use crate::types::timestamp::Timestamp;

/// Everything a session needs from its surroundings. Mutations go through
/// here so that every change is persisted before it can be observed.
pub struct Runtime<'a> {
    bank: &'a QuestionBank,
    store: &'a dyn Store,
    config: &'a Config,
}

impl<'a> Runtime<'a> {
    pub fn new(bank: &'a QuestionBank, store: &'a dyn Store, config: &'a Config) -> Self {
        Self {
            bank,
            store,
            config,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        self.bank
    }

    /// The stored session, if there is a usable one.
    pub fn load_session(&self) -> Fallible<Option<Session>> {
        match self.store.get(SESSION_KEY)? {
            Some(bytes) => Ok(normalize_for_runtime(&bytes, self.config)),
            None => Ok(None),
        }
    }

    pub fn save_session(&self, session: &Session) -> Fallible<()> {
        let bytes = serde_json::to_vec(session)?;
        self.store.set(SESSION_KEY, &bytes)
    }

    /// Resume the stored session if it matches the filters and is still
    /// running. Otherwise, or when `force_fresh` is set, start a new one.
    pub fn create_session(
        &self,
        filters: &Filters,
        force_fresh: bool,
        now: Timestamp,
    ) -> Fallible<Session> {
        let key = filters.session_key();
        let existing = self.load_session()?;
        if let Some(session) = &existing {
            if !force_fresh && !session.is_completed() && session.key() == key {
                log::debug!("Resuming session {}", session.seed());
                return Ok(session.clone());
            }
        }

        let mode = filters.mode();
        let pool: Vec<String> = match mode {
            Mode::Review => self.bank.filter_ids(filters.domain_id(), filters.section()),
            Mode::Timed => self.bank.all_ids(),
        };

        let seed = fresh_seed(&key, now, existing.as_ref().map(|s| s.seed()));

        let pool: Vec<String> = match mode {
            Mode::Timed => {
                let exam_size = self.config.exam_size;
                if pool.len() < exam_size {
                    return fail(format!(
                        "not enough questions for a timed exam: need {exam_size}, have {}.",
                        pool.len()
                    ));
                }
                if pool.len() > exam_size {
                    pick_subset(&pool, exam_size, &format!("{seed}::exam"))
                } else {
                    pool
                }
            }
            Mode::Review => {
                let max = self.config.review_max_questions;
                if pool.len() > max {
                    log::debug!("Sampling {max} of {} questions.", pool.len());
                    pick_subset(&pool, max, &format!("{seed}::sample"))
                } else {
                    pool
                }
            }
        };

        let question_ids = shuffle(&pool, &seed);
        if question_ids.is_empty() {
            return fail("no questions match filters.");
        }

        let (started_at, duration_sec, scored_ids) = match mode {
            Mode::Timed => (
                Some(now),
                Some(self.config.duration_sec),
                derive_scored_ids(&question_ids, &seed, self.config.scored_count),
            ),
            Mode::Review => (None, None, BTreeSet::new()),
        };

        let session = Session {
            mode,
            domain_id: filters.domain_id().to_string(),
            section: filters.section().to_string(),
            seed,
            question_ids,
            answers: BTreeMap::new(),
            flagged_questions: BTreeSet::new(),
            current_index: 0,
            scored_ids,
            started_at,
            duration_sec,
            completed: false,
            created_at: now,
            completed_at: None,
            completion_reason: None,
        };
        self.save_session(&session)?;
        log::debug!(
            "Created {} session {} with {} questions.",
            session.mode(),
            session.seed(),
            session.len()
        );
        Ok(session)
    }

    /// Record an answer. Unknown questions and invalid choices are ignored.
    pub fn select_answer(
        &self,
        session: &mut Session,
        question_id: &str,
        answer: Answer,
    ) -> Fallible<()> {
        let Some(question) = self.bank.get(question_id) else {
            return Ok(());
        };
        if session.select_answer(question, answer) {
            self.save_session(session)?;
        }
        Ok(())
    }

    pub fn toggle_flag(&self, session: &mut Session, question_id: &str) -> Fallible<()> {
        if session.toggle_flag(question_id) {
            self.save_session(session)?;
        }
        Ok(())
    }

    pub fn navigate(&self, session: &mut Session, index: i64) -> Fallible<()> {
        if session.navigate(index) {
            self.save_session(session)?;
        }
        Ok(())
    }

    pub fn next_question(&self, session: &mut Session) -> Fallible<()> {
        if session.next_question() {
            self.save_session(session)?;
        }
        Ok(())
    }

    pub fn previous_question(&self, session: &mut Session) -> Fallible<()> {
        if session.previous_question() {
            self.save_session(session)?;
        }
        Ok(())
    }

    /// Freeze the clock. Nothing is persisted: a reload resumes the clock.
    pub fn pause(&self, session: &Session, now: Timestamp) -> Option<PauseState> {
        let pause = session.pause(now);
        if let Some(pause) = &pause {
            log::debug!("Paused with {}s remaining.", pause.frozen_time());
        }
        pause
    }

    pub fn resume(&self, session: &mut Session, pause: PauseState, now: Timestamp) -> Fallible<()> {
        if session.resume(pause, now) {
            self.save_session(session)?;
        }
        Ok(())
    }

    /// Complete the session, score it, and record it in the history. Returns
    /// `None` if the session was already completed.
    pub fn complete(
        &self,
        session: &mut Session,
        reason: CompletionReason,
        now: Timestamp,
    ) -> Fallible<Option<ScoreResult>> {
        if !session.complete(reason, now) {
            return Ok(None);
        }
        let score = self.score(session);
        self.save_session(session)?;
        record(
            self.store,
            HistoryEntry::new(session, score.clone(), now),
            self.config.history_limit,
        )?;
        log::debug!(
            "Session {} completed ({:?}): {}/{} points.",
            session.seed(),
            reason,
            score.points,
            score.total_points
        );
        Ok(Some(score))
    }

    /// Called on every refresh. Completes a timed session whose time is up.
    pub fn tick(
        &self,
        session: &mut Session,
        pause: Option<&PauseState>,
        now: Timestamp,
    ) -> Fallible<Option<ScoreResult>> {
        if session.is_expired(now, pause) {
            return self.complete(session, CompletionReason::Expired, now);
        }
        Ok(None)
    }

    pub fn score(&self, session: &Session) -> ScoreResult {
        compute_score(session, self.bank, self.config)
    }

    pub fn history(&self) -> Fallible<Vec<HistoryEntry>> {
        load_history(self.store)
    }
}

/// A seed for a new session. Two sessions created in the same millisecond
/// get distinct seeds by way of a counter suffix.
fn fresh_seed(key: &str, now: Timestamp, previous: Option<&str>) -> String {
    let base = format!("{key}::{}", now.as_millis());
    let Some(previous) = previous else {
        return base;
    };
    if previous == base {
        return format!("{base}::1");
    }
    let counter = previous
        .strip_prefix(base.as_str())
        .and_then(|rest| rest.strip_prefix("::"))
        .and_then(|n| n.parse::<u64>().ok());
    match counter {
        Some(n) => format!("{base}::{}", n + 1),
        None => base,
    }
}
