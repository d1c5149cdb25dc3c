//! Core data model types for netquiz.
//!
//! Questions and question banks are immutable once loaded; everything the
//! candidate does lives in [`crate::session::Session`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric question identifier, unique within a bank.
pub type QuestionId = u32;

/// Default minimum score for a coding answer to count as correct.
pub const DEFAULT_MIN_PASS_SCORE: u8 = 60;

/// The kind of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Exactly one option may be selected.
    Single,
    /// Any subset of the options may be selected.
    Multiple,
    /// Free-form code answer.
    Coding,
}

impl QuestionKind {
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionKind::Single | QuestionKind::Multiple)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Single => write!(f, "single"),
            QuestionKind::Multiple => write!(f, "multiple"),
            QuestionKind::Coding => write!(f, "coding"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single-choice" => Ok(QuestionKind::Single),
            "multiple" | "multi" | "multi-choice" => Ok(QuestionKind::Multiple),
            "coding" | "code" => Ok(QuestionKind::Coding),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// Optional per-question rules for coding answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Keywords the answer is expected to mention.
    #[serde(default)]
    pub required_keywords: Vec<String>,
    /// Literal fragments the answer is expected to contain.
    #[serde(default)]
    pub required_patterns: Vec<String>,
    /// Minimum code score for the answer to count as correct.
    #[serde(default = "default_min_pass_score")]
    pub min_pass_score: u8,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            required_keywords: Vec::new(),
            required_patterns: Vec::new(),
            min_pass_score: DEFAULT_MIN_PASS_SCORE,
        }
    }
}

fn default_min_pass_score() -> u8 {
    DEFAULT_MIN_PASS_SCORE
}

/// Kind-specific question content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuestionBody {
    Single(ChoiceBody),
    Multiple(ChoiceBody),
    Coding(CodingBody),
}

/// Options and obfuscated answer key of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceBody {
    pub options: Vec<String>,
    /// Correct option indices, encoded with [`crate::codec::obfuscate`].
    pub correct: Vec<u32>,
}

/// Reference material for a coding question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingBody {
    pub language: String,
    #[serde(default)]
    pub placeholder: String,
    pub reference_solution: String,
    #[serde(default)]
    pub scoring: Option<ScoringPolicy>,
}

impl CodingBody {
    pub fn min_pass_score(&self) -> u8 {
        self.scoring
            .as_ref()
            .map(|s| s.min_pass_score)
            .unwrap_or(DEFAULT_MIN_PASS_SCORE)
    }
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub prompt: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self.body {
            QuestionBody::Single(_) => QuestionKind::Single,
            QuestionBody::Multiple(_) => QuestionKind::Multiple,
            QuestionBody::Coding(_) => QuestionKind::Coding,
        }
    }

    /// The choice body, if this is a single- or multi-choice question.
    pub fn choices(&self) -> Option<&ChoiceBody> {
        match &self.body {
            QuestionBody::Single(c) | QuestionBody::Multiple(c) => Some(c),
            QuestionBody::Coding(_) => None,
        }
    }

    pub fn coding(&self) -> Option<&CodingBody> {
        match &self.body {
            QuestionBody::Coding(c) => Some(c),
            _ => None,
        }
    }

    /// Display label of an option, falling back to a 1-based placeholder.
    pub fn option_label(&self, index: usize) -> String {
        self.choices()
            .and_then(|c| c.options.get(index))
            .cloned()
            .unwrap_or_else(|| format!("Option {}", index + 1))
    }
}

/// An ordered collection of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.get(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coding_question() -> Question {
        Question {
            id: 42,
            category: "Sockets".into(),
            prompt: "Open a socket".into(),
            body: QuestionBody::Coding(CodingBody {
                language: "python".into(),
                placeholder: String::new(),
                reference_solution: "import socket".into(),
                scoring: None,
            }),
        }
    }

    #[test]
    fn kind_display_and_parse() {
        assert_eq!(QuestionKind::Single.to_string(), "single");
        assert_eq!("multi".parse::<QuestionKind>().unwrap(), QuestionKind::Multiple);
        assert_eq!("Coding".parse::<QuestionKind>().unwrap(), QuestionKind::Coding);
        assert!("essay".parse::<QuestionKind>().is_err());
        assert!(QuestionKind::Multiple.is_choice());
        assert!(!QuestionKind::Coding.is_choice());
    }

    #[test]
    fn min_pass_score_defaults_to_sixty() {
        let q = coding_question();
        assert_eq!(q.coding().unwrap().min_pass_score(), 60);
        assert!(q.choices().is_none());
    }

    #[test]
    fn option_label_falls_back() {
        let q = Question {
            id: 1,
            category: "OSI".into(),
            prompt: "Pick".into(),
            body: QuestionBody::Single(ChoiceBody {
                options: vec!["IP".into()],
                correct: vec![],
            }),
        };
        assert_eq!(q.option_label(0), "IP");
        assert_eq!(q.option_label(3), "Option 4");
    }

    #[test]
    fn question_serde_roundtrip() {
        let q = coding_question();
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"kind\":\"coding\""));
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
