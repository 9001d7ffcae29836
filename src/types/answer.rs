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

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

/// A set of choice indices: either a question's correct answer, or what the
/// user selected. In JSON, a bare integer or an array of integers.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(usize),
    Multiple(BTreeSet<usize>),
}

impl Answer {
    pub fn multiple(indices: impl IntoIterator<Item = usize>) -> Self {
        Answer::Multiple(indices.into_iter().collect())
    }

    pub fn indices(&self) -> BTreeSet<usize> {
        match self {
            Answer::Single(i) => BTreeSet::from([*i]),
            Answer::Multiple(set) => set.clone(),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Answer::Multiple(_))
    }

    /// Whether `selected` is exactly this answer. Single answers compare by
    /// index, everything else by set equality.
    pub fn matches(&self, selected: &Answer) -> bool {
        match (self, selected) {
            (Answer::Single(a), Answer::Single(b)) => a == b,
            _ => self.indices() == selected.indices(),
        }
    }

    /// Whether every index refers to one of `choice_count` choices.
    pub fn is_valid_for(&self, choice_count: usize) -> bool {
        match self {
            Answer::Single(i) => *i < choice_count,
            Answer::Multiple(set) => !set.is_empty() && set.iter().all(|i| *i < choice_count),
        }
    }
}
