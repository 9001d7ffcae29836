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
use crate::history::HistoryEntry;
use crate::history::load_history;
use crate::store::Store;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    session_count: usize,
    passed_count: usize,
    sessions: Vec<HistoryEntry>,
}

impl HistoryReport {
    fn new(sessions: Vec<HistoryEntry>) -> Self {
        Self {
            session_count: sessions.len(),
            passed_count: sessions.iter().filter(|e| e.score.passed).count(),
            sessions,
        }
    }
}

pub fn print_history(store: &dyn Store) -> Fallible<()> {
    let report = HistoryReport::new(load_history(store)?);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}
