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
use std::path::PathBuf;

use clap::Parser;

use crate::bank::ALL;
use crate::bank::QuestionBank;
use crate::cmd::check::check_dataset;
use crate::cmd::drill::drill;
use crate::cmd::history::print_history;
use crate::cmd::reset::reset_session;
use crate::cmd::score::print_score;
use crate::config::Config;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::session::Filters;
use crate::session::runtime::Runtime;
use crate::store::SqliteStore;

const DEFAULT_DB: &str = "examdrill.db";

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Start or resume a practice session.
    Drill {
        /// Path to the question dataset.
        dataset: String,
        /// Path to the session database.
        #[arg(long)]
        db: Option<String>,
        /// Path to the config file.
        #[arg(long)]
        config: Option<String>,
        /// Session mode: review or timed.
        #[arg(long, default_value = "review")]
        mode: String,
        /// Domain to review. Ignored for timed exams.
        #[arg(long, default_value = ALL)]
        domain: String,
        /// Section to review. Ignored for timed exams.
        #[arg(long, default_value = ALL)]
        section: String,
        /// Start a new session even if a matching one is in progress.
        #[arg(long)]
        fresh: bool,
    },
    /// Print the score of the current session as JSON.
    Score {
        /// Path to the question dataset.
        dataset: String,
        /// Path to the session database.
        #[arg(long)]
        db: Option<String>,
        /// Path to the config file.
        #[arg(long)]
        config: Option<String>,
    },
    /// Print the history of completed sessions as JSON.
    History {
        /// Path to the session database.
        #[arg(long)]
        db: Option<String>,
    },
    /// Check the integrity of a dataset.
    Check {
        /// Path to the question dataset.
        dataset: String,
    },
    /// Discard the current session.
    Reset {
        /// Path to the session database.
        #[arg(long)]
        db: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            dataset,
            db,
            config,
            mode,
            domain,
            section,
            fresh,
        } => {
            let config = Config::load(config.as_deref().map(Path::new))?;
            let bank = QuestionBank::load(Path::new(&dataset))?;
            let store = open_store(db)?;
            let runtime = Runtime::new(&bank, &store, &config);
            let filters = Filters::new(&mode, &domain, &section);
            drill(&runtime, &filters, fresh)
        }
        Command::Score {
            dataset,
            db,
            config,
        } => {
            let config = Config::load(config.as_deref().map(Path::new))?;
            let bank = QuestionBank::load(Path::new(&dataset))?;
            let store = open_store(db)?;
            print_score(&Runtime::new(&bank, &store, &config))
        }
        Command::History { db } => print_history(&open_store(db)?),
        Command::Check { dataset } => check_dataset(Path::new(&dataset)),
        Command::Reset { db } => reset_session(&open_store(db)?),
    }
}

fn open_store(db: Option<String>) -> Fallible<SqliteStore> {
    let path = PathBuf::from(db.unwrap_or_else(|| DEFAULT_DB.to_string()));
    log::debug!("Opening store at {}", path.display());
    SqliteStore::new(
        path.to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?,
    )
}
