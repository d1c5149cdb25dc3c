//! Result projection: turns a session plus its question bank into a score.
//!
//! The overall percentage is the mean of per-question contributions, where a
//! choice question contributes 0 or 100 and a coding question contributes its
//! heuristic score. It is therefore not `correct_answers / total`; both
//! numbers are reported.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::codec::deobfuscate;
use crate::model::{ChoiceBody, CodingBody, Question, QuestionBank, QuestionId, QuestionKind};
use crate::scoring::{check_patterns, score_code, CodeScore, PatternCheck};
use crate::session::Session;

/// Aggregate result of a quiz run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// Rounded mean of per-question contributions (0–100).
    pub percentage: u8,
    pub details: Vec<QuestionOutcome>,
}

/// How one question was answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub prompt: String,
    pub category: String,
    pub kind: QuestionKind,
    pub is_correct: bool,
    /// Contribution to the overall percentage.
    pub score: u8,
    pub user_answer: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_score: Option<CodeScore>,
    /// Coverage of the question's required keywords and patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<PatternCheck>,
}

/// Score every question in `bank` against `session`.
pub fn compute_result(bank: &QuestionBank, session: &Session) -> QuizResult {
    let details: Vec<QuestionOutcome> = bank
        .questions
        .iter()
        .map(|q| match q.coding() {
            Some(body) => coding_outcome(q, body, session),
            None => choice_outcome(q, session),
        })
        .collect();

    let total_questions = details.len();
    let correct_answers = details.iter().filter(|d| d.is_correct).count();
    let percentage = if total_questions == 0 {
        0
    } else {
        let sum: u32 = details.iter().map(|d| u32::from(d.score)).sum();
        (f64::from(sum) / total_questions as f64).round() as u8
    };

    QuizResult {
        total_questions,
        correct_answers,
        incorrect_answers: total_questions - correct_answers,
        percentage,
        details,
    }
}

fn coding_outcome(question: &Question, body: &CodingBody, session: &Session) -> QuestionOutcome {
    let user = session
        .code_answers
        .get(&question.id)
        .map(String::as_str)
        .unwrap_or("");
    let code_score = score_code(user, &body.reference_solution);
    let is_correct = code_score.score >= body.min_pass_score();

    let requirements = body.scoring.as_ref().and_then(|policy| {
        let required: Vec<String> = policy
            .required_keywords
            .iter()
            .chain(policy.required_patterns.iter())
            .cloned()
            .collect();
        (!required.is_empty()).then(|| check_patterns(user, &required))
    });

    QuestionOutcome {
        question_id: question.id,
        prompt: question.prompt.clone(),
        category: question.category.clone(),
        kind: QuestionKind::Coding,
        is_correct,
        score: code_score.score,
        user_answer: user.to_string(),
        correct_answer: body.reference_solution.clone(),
        code_score: Some(code_score),
        requirements,
    }
}

fn choice_outcome(question: &Question, session: &Session) -> QuestionOutcome {
    let empty = BTreeSet::new();
    let selected = session.choice_answers.get(&question.id).unwrap_or(&empty);

    let reference = question.choices().map(decode_reference).unwrap_or_else(|| {
        tracing::warn!(question = question.id, "choice question without options");
        None
    });

    let is_correct = reference.as_ref().is_some_and(|r| r == selected);

    let labels = |indices: &BTreeSet<usize>| {
        indices
            .iter()
            .map(|&i| question.option_label(i))
            .collect::<Vec<_>>()
            .join(", ")
    };

    QuestionOutcome {
        question_id: question.id,
        prompt: question.prompt.clone(),
        category: question.category.clone(),
        kind: question.kind(),
        is_correct,
        score: if is_correct { 100 } else { 0 },
        user_answer: labels(selected),
        correct_answer: reference.as_ref().map(labels).unwrap_or_default(),
        code_score: None,
        requirements: None,
    }
}

fn decode_reference(body: &ChoiceBody) -> Option<BTreeSet<usize>> {
    match deobfuscate(&body.correct) {
        Ok(indices) => Some(indices.into_iter().collect()),
        Err(e) => {
            tracing::warn!("undecodable answer key: {e}");
            None
        }
    }
}

impl QuizResult {
    /// Save the result as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result to {}", path.display()))?;
        Ok(())
    }

    /// Load a result previously written by [`QuizResult::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse result JSON")
    }

    /// Number of questions that have any recorded answer.
    pub fn answered(&self) -> usize {
        self.details
            .iter()
            .filter(|d| !d.user_answer.trim().is_empty())
            .count()
    }
}
