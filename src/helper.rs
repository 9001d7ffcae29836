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

use crate::bank::QuestionBank;
use crate::types::answer::Answer;
use crate::types::question::Question;

/// Build a bank of `n` four-choice questions with IDs `q0`, `q1`, ...
///
/// Question `qi` is in domain `d{i % 3}` and section `s{i % 2}`, and its
/// correct answer is choice `i % 4`.
pub fn sample_bank(n: usize) -> QuestionBank {
    let questions = (0..n)
        .map(|i| Question {
            id: format!("q{i}"),
            domain_id: format!("d{}", i % 3),
            domain: format!("Domain {}", i % 3),
            section: format!("s{}", i % 2),
            question: format!("Question {i}?"),
            choices: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            answer: Answer::Single(i % 4),
            explanation: String::new(),
        })
        .collect();
    match QuestionBank::new(questions) {
        Ok(bank) => bank,
        Err(e) => panic!("invalid sample bank: {e}"),
    }
}

/// The correct answer for a question built by [`sample_bank`].
pub fn correct_answer(id: &str) -> Answer {
    let i: usize = id[1..].parse().expect("sample question id");
    Answer::Single(i % 4)
}

/// A wrong answer for a question built by [`sample_bank`].
pub fn wrong_answer(id: &str) -> Answer {
    let i: usize = id[1..].parse().expect("sample question id");
    Answer::Single((i + 1) % 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_bank() {
        let bank = sample_bank(5);
        assert_eq!(bank.len(), 5);
        let q = bank.get("q4").map(|q| q.answer.clone());
        assert_eq!(q, Some(correct_answer("q4")));
        assert_ne!(correct_answer("q4"), wrong_answer("q4"));
    }
}
