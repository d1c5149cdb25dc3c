//! The `netquiz code` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::Workspace;

pub fn execute(
    config: Option<PathBuf>,
    bank: Option<PathBuf>,
    file: Option<PathBuf>,
    text: Option<String>,
) -> Result<()> {
    let answer = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read answer file: {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => anyhow::bail!("pass --file or --text"),
    };

    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.resume()?;
    let question_id = controller
        .current_question()
        .map(|q| q.id)
        .ok_or_else(|| anyhow::anyhow!("no current question"))?;

    let lines = answer.lines().count();
    controller.set_code_answer(question_id, answer)?;
    println!("Saved answer for question {question_id} ({lines} line(s)).");

    Ok(())
}
