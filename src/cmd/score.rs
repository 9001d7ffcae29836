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

use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::session::CompletionReason;
use crate::session::Session;
use crate::session::runtime::Runtime;
use crate::session::score::ScoreResult;
use crate::types::mode::Mode;
use crate::types::timestamp::Timestamp;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    session_key: String,
    seed: String,
    mode: Mode,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_reason: Option<CompletionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_seconds: Option<i64>,
    flagged_count: usize,
    score: ScoreResult,
}

impl ScoreReport {
    fn new(session: &Session, score: ScoreResult, now: Timestamp) -> Self {
        Self {
            session_key: session.key(),
            seed: session.seed().to_string(),
            mode: session.mode(),
            completed: session.is_completed(),
            completion_reason: session.completion_reason(),
            remaining_seconds: session.remaining_seconds(now, None),
            flagged_count: session.flagged_questions().len(),
            score,
        }
    }
}

/// Print the score of the stored session. An expired timed session is
/// completed first, as the drill loop would on its next refresh.
pub fn print_score(runtime: &Runtime) -> Fallible<()> {
    let report = score_report(runtime, Timestamp::now())?;
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn score_report(runtime: &Runtime, now: Timestamp) -> Fallible<ScoreReport> {
    let Some(mut session) = runtime.load_session()? else {
        return fail("no session to score.");
    };
    let score = match runtime.tick(&mut session, None, now)? {
        Some(score) => score,
        None => runtime.score(&session),
    };
    Ok(ScoreReport::new(&session, score, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::ALL;
    use crate::config::Config;
    use crate::helper::sample_bank;
    use crate::session::Filters;
    use crate::store::MemoryStore;

    const T: i64 = 1_700_000_000_000;

    #[test]
    fn test_no_session() {
        let bank = sample_bank(4);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        assert!(score_report(&rt, Timestamp::new(T)).is_err());
    }

    #[test]
    fn test_running_session() -> Fallible<()> {
        let bank = sample_bank(65);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        rt.create_session(&Filters::new("timed", ALL, ALL), false, Timestamp::new(T))?;
        let report = score_report(&rt, Timestamp::new(T + 60_000))?;
        assert!(!report.completed);
        assert_eq!(report.remaining_seconds, Some(7740));
        assert_eq!(report.score.scored_count, 50);
        assert_eq!(report.score.points, 0);
        assert_eq!(rt.history()?.len(), 0);
        Ok(())
    }

    #[test]
    fn test_expired_session_is_completed() -> Fallible<()> {
        let bank = sample_bank(65);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        rt.create_session(&Filters::new("timed", ALL, ALL), false, Timestamp::new(T))?;
        let report = score_report(&rt, Timestamp::new(T + 9_000_000))?;
        assert!(report.completed);
        assert_eq!(report.completion_reason, Some(CompletionReason::Expired));
        assert_eq!(rt.history()?.len(), 1);
        // Scoring again does not record it twice.
        score_report(&rt, Timestamp::new(T + 9_500_000))?;
        assert_eq!(rt.history()?.len(), 1);
        Ok(())
    }
}
