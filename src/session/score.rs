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

use crate::bank::QuestionBank;
use crate::config::Config;
use crate::session::Session;
use crate::types::mode::Mode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub mode: Mode,
    pub total_questions: usize,
    pub answered_total: usize,
    pub correct_total: usize,
    /// Size of the scored subset. Zero in review mode.
    pub scored_count: usize,
    pub answered_scored: usize,
    pub correct_scored: usize,
    pub points: u32,
    pub total_points: u32,
    pub passed: bool,
}

/// Score a session against the bank.
///
/// Timed sessions earn a fixed number of points per correct scored
/// question. Review sessions scale the fraction correct, counting
/// unanswered questions as wrong, onto the review point range.
pub fn compute_score(session: &Session, bank: &QuestionBank, config: &Config) -> ScoreResult {
    let mode = session.mode();
    let mut answered_total = 0;
    let mut correct_total = 0;
    let mut answered_scored = 0;
    let mut correct_scored = 0;
    for id in session.question_ids() {
        let (Some(question), Some(selected)) = (bank.get(id), session.answer_for(id)) else {
            continue;
        };
        let correct = question.is_correct(selected);
        answered_total += 1;
        if correct {
            correct_total += 1;
        }
        if mode == Mode::Timed && session.is_scored(id) {
            answered_scored += 1;
            if correct {
                correct_scored += 1;
            }
        }
    }

    let total_questions = session.len();
    let (scored_count, points, total_points) = match mode {
        Mode::Timed => (
            session.scored_ids().len(),
            config.timed_total_points(correct_scored),
            config.timed_total_points(session.scored_ids().len()),
        ),
        Mode::Review => {
            let points = if total_questions == 0 {
                0
            } else {
                let fraction = correct_total as f64 / total_questions as f64;
                (fraction * config.review_total_points as f64).round() as u32
            };
            (0, points, config.review_total_points)
        }
    };

    ScoreResult {
        mode,
        total_questions,
        answered_total,
        correct_total,
        scored_count,
        answered_scored,
        correct_scored,
        points,
        total_points,
        passed: points >= config.passing_score,
    }
}
