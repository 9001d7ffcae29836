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

use std::io::BufRead;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;

use crate::error::Fallible;
use crate::session::CompletionReason;
use crate::session::Filters;
use crate::session::Session;
use crate::session::pause::PauseState;
use crate::session::runtime::Runtime;
use crate::session::score::ScoreResult;
use crate::types::answer::Answer;
use crate::types::mode::Mode;
use crate::types::timestamp::Timestamp;

const HELP: &str = "Commands: a choice number (or a list like 1,3) answers, \
n/p move, g N jumps, f flags, pause, resume, submit, q quits.";

/// Start or resume a session and drill through it on the terminal.
pub fn drill(runtime: &Runtime, filters: &Filters, fresh: bool) -> Fallible<()> {
    let mut session = runtime.create_session(filters, fresh, Timestamp::now())?;
    let stdin = stdin();
    let stdout = stdout();
    run(
        runtime,
        &mut session,
        &mut stdin.lock(),
        &mut stdout.lock(),
        &Timestamp::now,
    )
}

#[derive(Debug, PartialEq)]
enum Input {
    Answer(Answer),
    Next,
    Previous,
    Goto(i64),
    Flag,
    Pause,
    Resume,
    Submit,
    Quit,
    Help,
    Invalid,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "n" | "next" => return Input::Next,
        "p" | "prev" => return Input::Previous,
        "f" | "flag" => return Input::Flag,
        "pause" => return Input::Pause,
        "resume" => return Input::Resume,
        "submit" => return Input::Submit,
        "q" | "quit" => return Input::Quit,
        "h" | "help" | "?" => return Input::Help,
        _ => {}
    }
    if let Some(rest) = line.strip_prefix("g ") {
        return match rest.trim().parse::<i64>() {
            Ok(n) => Input::Goto(n - 1),
            Err(_) => Input::Invalid,
        };
    }
    // Choices are numbered from one on screen.
    let choices: Option<Vec<usize>> = line
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok().filter(|n| *n > 0))
        .map(|n| n.map(|n| n - 1))
        .collect();
    match choices {
        Some(choices) if choices.len() == 1 && !line.contains(',') => {
            Input::Answer(Answer::Single(choices[0]))
        }
        Some(choices) if !choices.is_empty() => Input::Answer(Answer::multiple(choices)),
        _ => Input::Invalid,
    }
}

/// The drill loop. Reads commands from `input` until the session is
/// completed, the user quits, or the input ends. The session stays in the
/// store, so quitting leaves it resumable.
pub fn run<R: BufRead, W: Write>(
    runtime: &Runtime,
    session: &mut Session,
    input: &mut R,
    output: &mut W,
    clock: &dyn Fn() -> Timestamp,
) -> Fallible<()> {
    let mut pause: Option<PauseState> = None;
    writeln!(
        output,
        "{} session with {} questions. {HELP}",
        session.mode(),
        session.len()
    )?;
    loop {
        let now = clock();
        if let Some(score) = runtime.tick(session, pause.as_ref(), now)? {
            writeln!(output, "Time is up.")?;
            print_results(runtime, session, &score, output)?;
            return Ok(());
        }
        render(runtime, session, pause.as_ref(), now, output)?;
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        let command = parse_input(&line);

        if pause.is_some() && !matches!(command, Input::Resume | Input::Quit | Input::Help) {
            writeln!(output, "Paused. Type `resume` to continue.")?;
            continue;
        }

        match command {
            Input::Answer(answer) => {
                let Some(id) = session.current_question_id().map(|s| s.to_string()) else {
                    continue;
                };
                runtime.select_answer(session, &id, answer.clone())?;
                if session.answer_for(&id) != Some(&answer) {
                    writeln!(output, "Not a valid choice.")?;
                } else if session.mode() == Mode::Review {
                    reveal(runtime, session, &id, output)?;
                } else {
                    writeln!(output, "Answer recorded.")?;
                }
            }
            Input::Next => runtime.next_question(session)?,
            Input::Previous => runtime.previous_question(session)?,
            Input::Goto(index) => runtime.navigate(session, index)?,
            Input::Flag => {
                if let Some(id) = session.current_question_id().map(|s| s.to_string()) {
                    runtime.toggle_flag(session, &id)?;
                }
            }
            Input::Pause => match runtime.pause(session, clock()) {
                Some(p) => {
                    writeln!(output, "Paused.")?;
                    pause = Some(p);
                }
                None => writeln!(output, "Only timed exams can be paused.")?,
            },
            Input::Resume => match pause.take() {
                Some(p) => {
                    runtime.resume(session, p, clock())?;
                    writeln!(output, "Resumed.")?;
                }
                None => writeln!(output, "Not paused.")?,
            },
            Input::Submit => {
                let unanswered = session.len() - session.answered_count();
                if unanswered > 0 {
                    writeln!(output, "Submitting with {unanswered} unanswered.")?;
                }
                if let Some(score) =
                    runtime.complete(session, CompletionReason::Submitted, clock())?
                {
                    print_results(runtime, session, &score, output)?;
                }
                return Ok(());
            }
            Input::Quit => {
                writeln!(output, "Session saved.")?;
                return Ok(());
            }
            Input::Help => writeln!(output, "{HELP}")?,
            Input::Invalid => writeln!(output, "Invalid input. Type `help` for commands.")?,
        }
    }
}

fn render<W: Write>(
    runtime: &Runtime,
    session: &Session,
    pause: Option<&PauseState>,
    now: Timestamp,
    output: &mut W,
) -> Fallible<()> {
    let Some(id) = session.current_question_id() else {
        return Ok(());
    };
    let Some(question) = runtime.bank().get(id) else {
        writeln!(output, "Question {id} is missing from the dataset.")?;
        return Ok(());
    };
    let mut header = format!("[{}/{}]", session.current_index() + 1, session.len());
    if session.is_answered(id) {
        header.push_str(" (answered)");
    }
    if session.is_flagged(id) {
        header.push_str(" (flagged)");
    }
    if let Some(remaining) = session.remaining_seconds(now, pause) {
        header.push_str(&format!(" time left {}", format_duration(remaining)));
        if pause.is_some() {
            header.push_str(" (paused)");
        }
    }
    writeln!(output)?;
    writeln!(output, "{header}")?;
    writeln!(output, "{} / {}", question.domain, question.section)?;
    writeln!(output, "{}", question.question)?;
    let selected = session.answer_for(id).map(|a| a.indices()).unwrap_or_default();
    for (i, choice) in question.choices.iter().enumerate() {
        let mark = if selected.contains(&i) { "*" } else { " " };
        writeln!(output, " {mark}{}. {choice}", i + 1)?;
    }
    if question.is_multi_select() {
        writeln!(output, "(select all that apply)")?;
    }
    Ok(())
}

fn reveal<W: Write>(
    runtime: &Runtime,
    session: &Session,
    id: &str,
    output: &mut W,
) -> Fallible<()> {
    let (Some(question), Some(selected)) = (runtime.bank().get(id), session.answer_for(id))
    else {
        return Ok(());
    };
    if question.is_correct(selected) {
        writeln!(output, "Correct.")?;
    } else {
        let correct: Vec<String> = question
            .answer
            .indices()
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        writeln!(output, "Incorrect. The answer is {}.", correct.join(", "))?;
    }
    if !question.explanation.is_empty() {
        writeln!(output, "{}", question.explanation)?;
    }
    Ok(())
}

fn print_results<W: Write>(
    runtime: &Runtime,
    session: &Session,
    score: &ScoreResult,
    output: &mut W,
) -> Fallible<()> {
    writeln!(output)?;
    if session.mode() == Mode::Timed {
        // Timed exams reveal results only at the end.
        for (i, id) in session.question_ids().iter().enumerate() {
            let status = match (runtime.bank().get(id), session.answer_for(id)) {
                (Some(q), Some(a)) if q.is_correct(a) => "correct",
                (_, Some(_)) => "incorrect",
                (_, None) => "unanswered",
            };
            let scored = if session.is_scored(id) { "" } else { " (unscored)" };
            writeln!(output, "{:>3}. {id}: {status}{scored}", i + 1)?;
        }
        writeln!(
            output,
            "Scored questions correct: {}/{}",
            score.correct_scored, score.scored_count
        )?;
    } else {
        writeln!(
            output,
            "Correct: {}/{}",
            score.correct_total, score.total_questions
        )?;
    }
    let verdict = if score.passed { "PASS" } else { "FAIL" };
    writeln!(
        output,
        "Score: {}/{} ({verdict})",
        score.points, score.total_points
    )?;
    Ok(())
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use super::*;
    use crate::bank::ALL;
    use crate::bank::QuestionBank;
    use crate::config::Config;
    use crate::helper::sample_bank;
    use crate::store::MemoryStore;

    const T: i64 = 1_700_000_000_000;

    fn run_script(
        runtime: &Runtime,
        session: &mut Session,
        script: &str,
        now: i64,
    ) -> Fallible<String> {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output: Vec<u8> = Vec::new();
        run(runtime, session, &mut input, &mut output, &|| Timestamp::new(now))?;
        Ok(String::from_utf8_lossy(&output).to_string())
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("2\n"), Input::Answer(Answer::Single(1)));
        assert_eq!(parse_input("1, 3"), Input::Answer(Answer::multiple([0, 2])));
        assert_eq!(parse_input("3,"), Input::Invalid);
        assert_eq!(parse_input("0"), Input::Invalid);
        assert_eq!(parse_input("g 5"), Input::Goto(4));
        assert_eq!(parse_input("g x"), Input::Invalid);
        assert_eq!(parse_input(" n "), Input::Next);
        assert_eq!(parse_input("submit"), Input::Submit);
        assert_eq!(parse_input("hello"), Input::Invalid);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(7800), "02:10:00");
        assert_eq!(format_duration(61), "00:01:01");
        assert_eq!(format_duration(-3), "00:00:00");
    }

    #[test]
    fn test_review_drill() -> Fallible<()> {
        let bank = QuestionBank::load(Path::new("./test/questions.json"))?;
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        let filters = Filters::new("review", "storage", ALL);
        let mut session = rt.create_session(&filters, false, Timestamp::new(T))?;
        let first = session.question_ids()[0].clone();
        let correct = bank.get(&first).map(|q| q.answer.clone()).expect("question");
        let Answer::Single(index) = correct else {
            panic!("storage questions are single-answer");
        };
        let script = format!("{}\nf\nn\n9\nsubmit\n", index + 1);
        let output = run_script(&rt, &mut session, &script, T)?;
        assert!(output.contains("Correct."));
        assert!(output.contains("Not a valid choice."));
        assert!(output.contains("(flagged)"));
        assert!(output.contains("Submitting with 1 unanswered."));
        assert!(output.contains("Correct: 1/2"));
        assert!(output.contains("Score: 500/1000 (FAIL)"));
        assert!(session.is_completed());
        assert!(session.is_flagged(&first));
        assert_eq!(rt.history()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_quit_leaves_session_resumable() -> Fallible<()> {
        let bank = sample_bank(10);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        let filters = Filters::new("review", ALL, ALL);
        let mut session = rt.create_session(&filters, false, Timestamp::new(T))?;
        let output = run_script(&rt, &mut session, "g 4\nq\n", T)?;
        assert!(output.contains("Session saved."));
        let resumed = rt.create_session(&filters, false, Timestamp::new(T + 1_000))?;
        assert_eq!(resumed.current_index(), 3);
        assert_eq!(resumed.seed(), session.seed());
        Ok(())
    }

    #[test]
    fn test_timed_drill_with_pause() -> Fallible<()> {
        let bank = sample_bank(65);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        let filters = Filters::new("timed", ALL, ALL);
        let mut session = rt.create_session(&filters, false, Timestamp::new(T))?;
        let script = "pause\n1\nresume\npause\nsubmit\n";
        let output = run_script(&rt, &mut session, script, T + 100_000)?;
        assert!(output.contains("time left 02:08:20"));
        assert!(output.contains("Paused. Type `resume` to continue."));
        assert!(output.contains("Resumed."));
        // Submitting is refused while paused, so the input runs out.
        assert!(!session.is_completed());
        Ok(())
    }

    #[test]
    fn test_timed_drill_submit() -> Fallible<()> {
        let bank = sample_bank(65);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        let filters = Filters::new("timed", ALL, ALL);
        let mut session = rt.create_session(&filters, false, Timestamp::new(T))?;
        let output = run_script(&rt, &mut session, "2\nsubmit\n", T + 1_000)?;
        assert!(output.contains("Answer recorded."));
        assert!(output.contains("(unscored)"));
        assert!(output.contains("Score: "));
        assert!(session.is_completed());
        assert_eq!(session.completion_reason(), Some(CompletionReason::Submitted));
        Ok(())
    }

    #[test]
    fn test_expired_session_completes_on_first_tick() -> Fallible<()> {
        let bank = sample_bank(65);
        let store = MemoryStore::new();
        let config = Config::default();
        let rt = Runtime::new(&bank, &store, &config);
        let filters = Filters::new("timed", ALL, ALL);
        let mut session = rt.create_session(&filters, false, Timestamp::new(T))?;
        let output = run_script(&rt, &mut session, "1\n", T + 7_800_000)?;
        assert!(output.contains("Time is up."));
        assert!(output.contains("Score: 0/1000 (FAIL)"));
        assert_eq!(session.completion_reason(), Some(CompletionReason::Expired));
        assert!(session.answers().is_empty());
        Ok(())
    }
}
