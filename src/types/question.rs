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

use crate::types::answer::Answer;

/// A multiple-choice question, as read from the dataset.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the exam domain, used for filtering.
    pub domain_id: String,
    /// Human-readable domain name.
    pub domain: String,
    /// Section within the domain, used for filtering.
    pub section: String,
    /// The prompt.
    pub question: String,
    /// The choices. A choice's position is its identity.
    pub choices: Vec<String>,
    /// The correct choice, or the set of correct choices.
    pub answer: Answer,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn is_multi_select(&self) -> bool {
        self.answer.is_multiple()
    }

    pub fn is_correct(&self, selected: &Answer) -> bool {
        self.answer.matches(selected)
    }

    /// Whether `selected` only refers to choices this question has.
    pub fn accepts(&self, selected: &Answer) -> bool {
        selected.is_valid_for(self.choices.len())
    }
}
