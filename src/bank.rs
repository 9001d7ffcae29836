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

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Instant;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::question::Question;

/// Filter value that matches every domain or section.
pub const ALL: &str = "all";

/// The question dataset. Loaded once, never mutated.
pub struct QuestionBank {
    questions: Vec<Question>,
    /// Map from question ID to its position in `questions`.
    index: HashMap<String, usize>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Fallible<Self> {
        let mut index = HashMap::new();
        for (pos, question) in questions.iter().enumerate() {
            if question.id.is_empty() {
                return fail(format!("question at position {pos} has an empty id."));
            }
            if question.choices.len() < 2 {
                return fail(format!(
                    "question {} has fewer than two choices.",
                    question.id
                ));
            }
            if !question.accepts(&question.answer) {
                return fail(format!(
                    "question {} has an answer that is not one of its choices.",
                    question.id
                ));
            }
            if index.insert(question.id.clone(), pos).is_some() {
                return fail(format!("duplicate question id: {}", question.id));
            }
        }
        Ok(Self { questions, index })
    }

    pub fn from_json(json: &str) -> Fallible<Self> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            return fail(format!("dataset {} does not exist.", path.display()));
        }
        log::debug!("Loading questions...");
        let start = Instant::now();
        let bank = Self::from_json(&read_to_string(path)?)?;
        let duration = start.elapsed().as_millis();
        log::debug!("Loaded {} questions in {duration}ms.", bank.len());
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|pos| &self.questions[*pos])
    }

    /// IDs of all questions, in dataset order.
    pub fn all_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.id.clone()).collect()
    }

    /// IDs of the questions in the given domain and section, in dataset
    /// order. [`ALL`] matches everything.
    pub fn filter_ids(&self, domain_id: &str, section: &str) -> Vec<String> {
        self.questions
            .iter()
            .filter(|q| domain_id == ALL || q.domain_id == domain_id)
            .filter(|q| section == ALL || q.section == section)
            .map(|q| q.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::helper::sample_bank;

    #[test]
    fn test_load_fixture() -> Fallible<()> {
        let bank = QuestionBank::load(&PathBuf::from("./test/questions.json"))?;
        assert_eq!(bank.len(), 6);
        let q = bank.get("net-1").map(|q| q.choices.len());
        assert_eq!(q, Some(4));
        assert!(bank.get("nope").is_none());
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = QuestionBank::load(&PathBuf::from("./derpherp.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_ids() {
        let bank = sample_bank(12);
        assert_eq!(bank.filter_ids(ALL, ALL).len(), 12);
        // Domains alternate d0, d1, d2; sections alternate s0, s1.
        assert_eq!(bank.filter_ids("d0", ALL), vec!["q0", "q3", "q6", "q9"]);
        assert_eq!(bank.filter_ids("d0", "s1"), vec!["q3", "q9"]);
        assert_eq!(bank.filter_ids(ALL, "s0").len(), 6);
        assert!(bank.filter_ids("d9", ALL).is_empty());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = r#"[
            {"id": "a", "domainId": "d", "domain": "D", "section": "s", "question": "?", "choices": ["x", "y"], "answer": 0},
            {"id": "a", "domainId": "d", "domain": "D", "section": "s", "question": "?", "choices": ["x", "y"], "answer": 1}
        ]"#;
        let err = QuestionBank::from_json(json).err().map(|e| e.to_string());
        assert_eq!(err, Some("error: duplicate question id: a".to_string()));
    }

    #[test]
    fn test_rejects_out_of_range_answer() {
        let json = r#"[
            {"id": "a", "domainId": "d", "domain": "D", "section": "s", "question": "?", "choices": ["x", "y"], "answer": [0, 2]}
        ]"#;
        assert!(QuestionBank::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_single_choice() {
        let json = r#"[
            {"id": "a", "domainId": "d", "domain": "D", "section": "s", "question": "?", "choices": ["x"], "answer": 0}
        ]"#;
        assert!(QuestionBank::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(QuestionBank::from_json("{").is_err());
    }
}
