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

use crate::types::timestamp::Timestamp;

/// A paused timer. Lives only in the running process; it is never
/// persisted, so reloading a paused session resumes its clock.
#[derive(Clone, Debug, PartialEq)]
pub struct PauseState {
    paused_at: Timestamp,
    /// Remaining seconds at the moment of pausing.
    frozen_time: i64,
}

impl PauseState {
    pub(super) fn new(paused_at: Timestamp, frozen_time: i64) -> Self {
        Self {
            paused_at,
            frozen_time,
        }
    }

    pub fn paused_at(&self) -> Timestamp {
        self.paused_at
    }

    pub fn frozen_time(&self) -> i64 {
        self.frozen_time
    }
}
