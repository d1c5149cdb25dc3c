//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::codec::deobfuscate;
use crate::model::{
    ChoiceBody, CodingBody, Question, QuestionBank, QuestionBody, QuestionId, QuestionKind,
    ScoringPolicy,
};

/// Intermediate TOML structure for parsing question bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: QuestionId,
    kind: String,
    #[serde(default)]
    category: String,
    prompt: String,
    #[serde(default)]
    options: Vec<String>,
    /// Obfuscated indices of the correct options.
    #[serde(default)]
    correct: Vec<u32>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    placeholder: String,
    #[serde(default)]
    reference_solution: String,
    #[serde(default)]
    scoring: Option<ScoringPolicy>,
}

fn default_language() -> String {
    "python".to_string()
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank`.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: QuestionKind = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            let body = match kind {
                QuestionKind::Single => QuestionBody::Single(ChoiceBody {
                    options: q.options,
                    correct: q.correct,
                }),
                QuestionKind::Multiple => QuestionBody::Multiple(ChoiceBody {
                    options: q.options,
                    correct: q.correct,
                }),
                QuestionKind::Coding => QuestionBody::Coding(CodingBody {
                    language: q.language,
                    placeholder: q.placeholder,
                    reference_solution: q.reference_solution,
                    scoring: q.scoring,
                }),
            };

            Ok(Question {
                id: q.id,
                category: q.category,
                prompt: q.prompt,
                body,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` question bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<QuestionId>,
    pub message: String,
    /// The bank cannot be played until this is fixed.
    pub fatal: bool,
}

impl ValidationWarning {
    fn question(id: QuestionId, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id),
            message: message.into(),
            fatal: false,
        }
    }

    fn fatal(id: QuestionId, message: impl Into<String>) -> Self {
        Self {
            fatal: true,
            ..Self::question(id, message)
        }
    }
}

/// Validate a question bank for common authoring mistakes.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
            fatal: true,
        });
    }

    let mut seen_ids = HashSet::new();
    for question in &bank.questions {
        if !seen_ids.insert(question.id) {
            warnings.push(ValidationWarning::fatal(
                question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }

        if question.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::question(question.id, "prompt is empty"));
        }

        match &question.body {
            QuestionBody::Single(choices) | QuestionBody::Multiple(choices) => {
                validate_choices(question, choices, &mut warnings);
            }
            QuestionBody::Coding(coding) => {
                if coding.reference_solution.trim().is_empty() {
                    warnings.push(ValidationWarning::question(
                        question.id,
                        "coding question has no reference_solution",
                    ));
                }
                if coding.min_pass_score() > 100 {
                    warnings.push(ValidationWarning::question(
                        question.id,
                        format!("min_pass_score {} is above 100", coding.min_pass_score()),
                    ));
                }
            }
        }
    }

    warnings
}

/// Reject a bank with mistakes that would break a session: duplicate IDs,
/// undecodable or out-of-range answer keys, or choice questions without a
/// usable correct answer. Cosmetic warnings are ignored.
pub fn ensure_playable(bank: &QuestionBank) -> Result<()> {
    let problems: Vec<String> = validate_bank(bank)
        .into_iter()
        .filter(|w| w.fatal)
        .map(|w| match w.question_id {
            Some(id) => format!("question {id}: {}", w.message),
            None => w.message,
        })
        .collect();

    if problems.is_empty() {
        return Ok(());
    }
    anyhow::bail!(
        "question bank '{}' is invalid: {}; run `netquiz validate` for details",
        bank.id,
        problems.join("; ")
    )
}

fn validate_choices(
    question: &Question,
    choices: &ChoiceBody,
    warnings: &mut Vec<ValidationWarning>,
) {
    if choices.options.is_empty() {
        warnings.push(ValidationWarning::fatal(
            question.id,
            "choice question has no options",
        ));
    }

    let decoded = match deobfuscate(&choices.correct) {
        Ok(decoded) => decoded,
        Err(e) => {
            warnings.push(ValidationWarning::fatal(question.id, e.to_string()));
            return;
        }
    };

    for index in &decoded {
        if *index >= choices.options.len() {
            warnings.push(ValidationWarning::fatal(
                question.id,
                format!(
                    "correct index {index} out of range ({} options)",
                    choices.options.len()
                ),
            ));
        }
    }

    match question.kind() {
        QuestionKind::Single if decoded.len() != 1 => {
            warnings.push(ValidationWarning::fatal(
                question.id,
                format!(
                    "single-choice question needs exactly one correct answer, found {}",
                    decoded.len()
                ),
            ));
        }
        QuestionKind::Multiple if decoded.is_empty() => {
            warnings.push(ValidationWarning::fatal(
                question.id,
                "multi-choice question has no correct answer",
            ));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::obfuscate_index;
    use std::path::PathBuf;

    fn valid_toml() -> String {
        format!(
            r#"
[bank]
id = "networking"
name = "Networking"
description = "Interview questions"

[[questions]]
id = 1
kind = "single"
category = "Fundamentals"
prompt = "What is the primary purpose of the OSI model?"
options = ["Speed", "Standardize communication", "Encryption"]
correct = [{one}]

[[questions]]
id = 2
kind = "multiple"
category = "OSI"
prompt = "Which protocols operate at layer 3?"
options = ["IP", "ICMP", "HTTP"]
correct = [{zero}, {one}]

[[questions]]
id = 3
kind = "coding"
category = "Sockets"
prompt = "Write a port scanner"
placeholder = "def scan(host):\n    pass"
reference_solution = """
import socket
def scan(host):
    pass
"""

[questions.scoring]
required_keywords = ["socket"]
min_pass_score = 70
"#,
            zero = obfuscate_index(0),
            one = obfuscate_index(1),
        )
    }

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(&valid_toml(), &PathBuf::from("test.toml")).unwrap();
        assert_eq!(bank.id, "networking");
        assert_eq!(bank.len(), 3);
        assert_eq!(bank.questions[0].kind(), QuestionKind::Single);
        assert_eq!(
            deobfuscate(&bank.questions[1].choices().unwrap().correct).unwrap(),
            vec![0, 1]
        );
        let coding = bank.questions[2].coding().unwrap();
        assert_eq!(coding.language, "python");
        assert_eq!(coding.min_pass_score(), 70);
        assert_eq!(
            coding.scoring.as_ref().unwrap().required_keywords,
            vec!["socket".to_string()]
        );
        assert!(validate_bank(&bank).is_empty());
    }

    #[test]
    fn parse_unknown_kind() {
        let toml = r#"
[bank]
id = "x"
name = "X"

[[questions]]
id = 1
kind = "essay"
prompt = "Discuss"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("test.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question kind"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_authoring_mistakes() {
        let toml = format!(
            r#"
[bank]
id = "broken"
name = "Broken"

[[questions]]
id = 1
kind = "single"
prompt = "Two answers"
options = ["a", "b"]
correct = [{zero}, {one}]

[[questions]]
id = 1
kind = "multiple"
prompt = " "
options = ["a"]
correct = [{five}]

[[questions]]
id = 7
kind = "single"
prompt = "Garbage key"
options = ["a"]
correct = [{garbage}]

[[questions]]
id = 8
kind = "coding"
prompt = "No reference"

[questions.scoring]
min_pass_score = 120
"#,
            zero = obfuscate_index(0),
            one = obfuscate_index(1),
            five = obfuscate_index(5),
            garbage = 0xABCD ^ 3,
        );
        let bank = parse_bank_str(&toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_bank(&bank);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));

        assert!(has("exactly one correct answer, found 2"));
        assert!(has("duplicate question ID: 1"));
        assert!(has("prompt is empty"));
        assert!(has("correct index 5 out of range"));
        assert!(has("invalid encoded answer index"));
        assert!(has("no reference_solution"));
        assert!(has("min_pass_score 120 is above 100"));
    }

    #[test]
    fn validate_empty_bank() {
        let toml = "[bank]\nid = \"empty\"\nname = \"Empty\"\n";
        let bank = parse_bank_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].question_id.is_none());
    }

    #[test]
    fn ensure_playable_accepts_valid_bank() {
        let bank = parse_bank_str(&valid_toml(), &PathBuf::from("test.toml")).unwrap();
        ensure_playable(&bank).unwrap();
    }

    #[test]
    fn ensure_playable_rejects_duplicate_ids() {
        let toml = format!(
            r#"
[bank]
id = "dupes"
name = "Dupes"

[[questions]]
id = 1
kind = "single"
prompt = "Pick one"
options = ["a", "b"]
correct = [{one}]

[[questions]]
id = 1
kind = "coding"
prompt = "Write code"
reference_solution = "import socket"
"#,
            one = obfuscate_index(1),
        );
        let bank = parse_bank_str(&toml, &PathBuf::from("test.toml")).unwrap();
        let err = ensure_playable(&bank).unwrap_err().to_string();
        assert!(err.contains("question 1: duplicate question ID: 1"), "{err}");
    }

    #[test]
    fn ensure_playable_ignores_cosmetic_warnings() {
        let toml = r#"
[bank]
id = "loose"
name = "Loose"

[[questions]]
id = 1
kind = "coding"
prompt = " "
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(validate_bank(&bank).len(), 2);
        ensure_playable(&bank).unwrap();
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), valid_toml()).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/bad.toml"), "not toml [").unwrap();
        std::fs::write(dir.path().join("notes.md"), "# ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "networking");
    }

    #[test]
    fn load_directory_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bank.toml");
        std::fs::write(&file, valid_toml()).unwrap();
        assert!(load_bank_directory(&file).is_err());
    }
}
