//! The `netquiz answer` command.

use std::path::PathBuf;

use anyhow::Result;

use netquiz_core::error::SessionError;
use netquiz_core::model::QuestionKind;

use super::{print_current, Workspace};

/// Select 1-based `options` on the current question. Single-choice questions
/// take exactly one option; multi-choice questions toggle each one given.
pub fn execute(config: Option<PathBuf>, bank: Option<PathBuf>, options: Vec<usize>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.resume()?;

    let (question_id, kind, available) = match controller.current_question() {
        Some(q) => (q.id, q.kind(), q.choices().map_or(0, |c| c.options.len())),
        None => anyhow::bail!("no current question"),
    };

    match kind {
        QuestionKind::Coding => {
            anyhow::bail!("question {question_id} is a coding question; use `netquiz code`")
        }
        QuestionKind::Single if options.len() != 1 => {
            anyhow::bail!("question {question_id} takes exactly one option")
        }
        _ => {}
    }

    // Every option is checked before any is applied; each selection persists.
    for &option in &options {
        if option == 0 {
            anyhow::bail!("option numbers start at 1");
        }
        if option > available {
            anyhow::bail!(
                "option {option} out of range for question {question_id} ({available} options)"
            );
        }
    }

    for option in options {
        controller
            .select_choice(question_id, option - 1)
            .map_err(|e| match e {
                SessionError::OptionOutOfRange {
                    question,
                    option,
                    available,
                } => anyhow::anyhow!(
                    "option {} out of range for question {question} ({available} options)",
                    option + 1
                ),
                other => other.into(),
            })?;
    }

    print_current(&controller);
    Ok(())
}
