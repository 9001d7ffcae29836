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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "examdrill.toml";

/// Longest timed exam, in seconds. Keeps the clock arithmetic in range
/// when working in milliseconds.
pub const MAX_DURATION_SEC: i64 = i64::MAX / 1000;

/// Exam constants. Every key is optional in the TOML file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of questions in a timed exam.
    pub exam_size: usize,
    /// How many of a timed exam's questions count toward the score.
    pub scored_count: usize,
    pub points_per_scored_question: u32,
    /// Minimum points to pass, in either mode.
    pub passing_score: u32,
    /// Length of a timed exam, in seconds.
    pub duration_sec: i64,
    /// Review sessions larger than this are downsampled.
    pub review_max_questions: usize,
    /// Review scores are scaled onto `0..=review_total_points`.
    pub review_total_points: u32,
    /// Maximum number of entries kept in the history log.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exam_size: 65,
            scored_count: 50,
            points_per_scored_question: 20,
            passing_score: 720,
            duration_sec: 7800,
            review_max_questions: 65,
            review_total_points: 1000,
            history_limit: 100,
        }
    }
}

impl Config {
    pub fn from_toml(source: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from `path`, or from [`CONFIG_FILE_NAME`] in the
    /// current directory. With neither, use the defaults.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        let path: PathBuf = match path {
            Some(path) => {
                if !path.exists() {
                    return fail(format!("config file {} does not exist.", path.display()));
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(CONFIG_FILE_NAME);
                if !path.exists() {
                    log::debug!("No config file, using defaults.");
                    return Ok(Config::default());
                }
                path
            }
        };
        log::debug!("Loading config from {}", path.display());
        Self::from_toml(&read_to_string(path)?)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.exam_size == 0 {
            return fail("exam_size must be positive.");
        }
        if self.scored_count > self.exam_size {
            return fail("scored_count cannot exceed exam_size.");
        }
        if self.review_max_questions == 0 {
            return fail("review_max_questions must be positive.");
        }
        if self.duration_sec <= 0 {
            return fail("duration_sec must be positive.");
        }
        if self.duration_sec > MAX_DURATION_SEC {
            return fail("duration_sec is too large.");
        }
        let counts = [
            ("exam_size", self.exam_size),
            ("scored_count", self.scored_count),
        ];
        for (key, count) in counts {
            let points = u32::try_from(count)
                .ok()
                .and_then(|n| n.checked_mul(self.points_per_scored_question));
            if points.is_none() {
                return fail(format!("{key} times points_per_scored_question is too large."));
            }
        }
        Ok(())
    }

    /// Points earned by `count` scored questions in a timed exam.
    pub fn timed_total_points(&self, count: usize) -> u32 {
        u32::try_from(count)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.points_per_scored_question)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timed_total_points(config.scored_count), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() -> Fallible<()> {
        let config = Config::from_toml("exam_size = 10\nscored_count = 8\n")?;
        assert_eq!(config.exam_size, 10);
        assert_eq!(config.scored_count, 8);
        assert_eq!(config.passing_score, 720);
        Ok(())
    }

    #[test]
    fn test_empty_toml() -> Fallible<()> {
        assert_eq!(Config::from_toml("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_toml("scored_count = 100").is_err());
        assert!(Config::from_toml("exam_size = 0\nscored_count = 0").is_err());
        assert!(Config::from_toml("duration_sec = 0").is_err());
        assert!(Config::from_toml("review_max_questions = 0").is_err());
        assert!(Config::from_toml("duration_sec = 9223372036854776").is_err());
    }

    #[test]
    fn test_points_must_fit() -> Fallible<()> {
        let source = "points_per_scored_question = 100000000\npassing_score = 1";
        assert!(Config::from_toml(source).is_err());
        // 65 * 66076420 overflows, 50 * 66076420 does not.
        let source = "points_per_scored_question = 66076420";
        assert!(Config::from_toml(source).is_err());
        let config = Config::from_toml("exam_size = 50\npoints_per_scored_question = 66076420")?;
        assert_eq!(config.timed_total_points(50), 3_303_821_000);
        assert_eq!(config.timed_total_points(usize::MAX), u32::MAX);
        Ok(())
    }

    #[test]
    fn test_unknown_key() {
        assert!(Config::from_toml("exam_sise = 10").is_err());
    }

    #[test]
    fn test_load_from_path() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("custom.toml");
        write(&path, "passing_score = 700\n")?;
        let config = Config::load(Some(&path))?;
        assert_eq!(config.passing_score, 700);
        Ok(())
    }

    #[test]
    fn test_load_missing_path() {
        assert!(Config::load(Some(Path::new("./derpherp.toml"))).is_err());
    }
}
