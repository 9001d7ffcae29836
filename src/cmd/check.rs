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

use std::path::Path;

use crate::bank::QuestionBank;
use crate::error::Fallible;

pub fn check_dataset(path: &Path) -> Fallible<()> {
    let bank = QuestionBank::load(path)?;
    println!("ok: {} questions.", bank.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::check_dataset;

    #[test]
    fn test_non_existent_dataset() {
        assert!(check_dataset(Path::new("./derpherp.json")).is_err());
    }

    #[test]
    fn test_dataset() {
        assert!(check_dataset(Path::new("./test/questions.json")).is_ok());
    }
}
