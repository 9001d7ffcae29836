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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Untimed practice. Answers are revealed immediately.
    Review,
    /// A fixed-size, fixed-duration mock exam.
    Timed,
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Review => "review",
            Mode::Timed => "timed",
        }
    }

    /// Coerce any mode string into a mode. Unknown values, including the
    /// legacy `practice`, become `Review`.
    pub fn normalize(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "timed" => Mode::Timed,
            _ => Mode::Review,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(Mode::normalize("timed"), Mode::Timed);
        assert_eq!(Mode::normalize(" Timed "), Mode::Timed);
        assert_eq!(Mode::normalize("review"), Mode::Review);
        assert_eq!(Mode::normalize("practice"), Mode::Review);
        assert_eq!(Mode::normalize(""), Mode::Review);
        assert_eq!(Mode::normalize("exam"), Mode::Review);
    }

    #[test]
    fn test_display() {
        assert_eq!(Mode::Review.to_string(), "review");
        assert_eq!(Mode::Timed.to_string(), "timed");
    }
}
