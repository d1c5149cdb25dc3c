//! The `netquiz result` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use netquiz_core::results::{compute_result, QuizResult};
use netquiz_core::session::SessionSnapshot;

use super::Workspace;

pub fn execute(
    config: Option<PathBuf>,
    bank: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let snapshot = SessionSnapshot::load(ws.store.as_ref())
        .context("failed to read saved session")?
        .ok_or_else(|| anyhow::anyhow!("no saved session; run `netquiz start` first"))?;
    let session = snapshot
        .into_session(&ws.bank)
        .context("saved session does not match the question bank")?;

    let result = compute_result(&ws.bank, &session);

    if let Some(path) = &output {
        result.save_json(path)?;
        eprintln!("Result saved to: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !session.completed {
            println!("Assessment still in progress.\n");
        }
        print_summary(&ws.bank.name, &result);
    }

    Ok(())
}

pub fn print_summary(bank_name: &str, result: &QuizResult) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Type", "Result", "Score", "Your answer"]);

    for (i, outcome) in result.details.iter().enumerate() {
        let answer = if outcome.user_answer.is_empty() {
            "-".to_string()
        } else {
            first_line(&outcome.user_answer)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&outcome.category),
            Cell::new(outcome.kind),
            Cell::new(if outcome.is_correct { "correct" } else { "incorrect" }),
            Cell::new(format!("{}%", outcome.score)),
            Cell::new(answer),
        ]);
    }

    println!("{bank_name}\n{table}");
    println!(
        "\nScore: {}% ({} correct, {} incorrect, {} answered of {})",
        result.percentage,
        result.correct_answers,
        result.incorrect_answers,
        result.answered(),
        result.total_questions
    );
}

fn first_line(text: &str) -> String {
    let mut lines = text.trim().lines();
    let first = lines.next().unwrap_or_default();
    if lines.next().is_some() {
        format!("{first} ...")
    } else {
        first.to_string()
    }
}
