//! The `netquiz score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use netquiz_core::scoring::score_code;

pub fn execute(reference: PathBuf, submission: PathBuf) -> Result<()> {
    let reference_text = std::fs::read_to_string(&reference)
        .with_context(|| format!("failed to read reference: {}", reference.display()))?;
    let submission_text = std::fs::read_to_string(&submission)
        .with_context(|| format!("failed to read submission: {}", submission.display()))?;

    let score = score_code(&submission_text, &reference_text);

    println!("Score: {}%", score.score);
    println!("Feedback: {}", score.feedback);
    if !score.matched_keywords.is_empty() {
        println!("Matched keywords: {}", join(&score.matched_keywords));
    }
    if !score.missing_keywords.is_empty() {
        println!("Missing keywords: {}", join(&score.missing_keywords));
    }

    Ok(())
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
