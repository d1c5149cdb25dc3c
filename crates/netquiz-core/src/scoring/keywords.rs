//! Keyword extraction and matching.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize::normalize;

/// Terms looked for as substrings of the normalized answer.
pub const VOCABULARY: &[&str] = &[
    // Python keywords
    "def", "if", "else", "elif", "for", "while", "try", "except", "finally", "import", "from",
    "return", "class", "lambda", "with", "as", "in", "is", "and", "or", "not", "True", "False",
    "None",
    // built-in functions
    "print", "len", "range", "enumerate", "zip", "map", "filter", "sorted", "max", "min", "sum",
    "any", "all", "open", "read", "write",
    // data structures
    "list", "dict", "tuple", "set", "str", "int", "float", "bool",
    // networking
    "socket", "connect", "bind", "listen", "accept", "send", "recv", "ip", "port", "host",
    "address", "network", "protocol", "tcp", "udp", "http", "https", "request", "response",
    "header", "status",
    // regular expressions
    "re", "match", "search", "findall", "sub", "compile", "pattern",
    // string and list methods
    "split", "join", "strip", "replace", "startswith", "endswith", "append", "extend", "insert",
    "remove", "pop", "index", "count",
];

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").expect("identifier pattern"));

/// Extract vocabulary hits and identifier-shaped tokens from `text`.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let normalized = normalize(text);

    let mut keywords: BTreeSet<String> = VOCABULARY
        .iter()
        .filter(|term| normalized.contains(&term.to_lowercase()))
        .map(|term| term.to_string())
        .collect();

    keywords.extend(
        IDENTIFIER
            .find_iter(&normalized)
            .map(|m| m.as_str().to_string()),
    );

    keywords
}

/// Qualitative band for a keyword score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackBand {
    Excellent,
    Good,
    Partial,
    Limited,
    NeedsImprovement,
}

impl FeedbackBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => FeedbackBand::Excellent,
            60..=79 => FeedbackBand::Good,
            40..=59 => FeedbackBand::Partial,
            20..=39 => FeedbackBand::Limited,
            _ => FeedbackBand::NeedsImprovement,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FeedbackBand::Excellent => "Excellent! Your solution covers most key concepts.",
            FeedbackBand::Good => "Good! Your solution shows understanding of the main concepts.",
            FeedbackBand::Partial => "Partial credit. Some key concepts are missing.",
            FeedbackBand::Limited => "Limited understanding. Consider reviewing the concepts.",
            FeedbackBand::NeedsImprovement => {
                "Please try again. The solution needs significant improvement."
            }
        }
    }
}

impl fmt::Display for FeedbackBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of matching user keywords against reference keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub score: u8,
    pub band: FeedbackBand,
    pub matched: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

/// Score how many reference keywords the user keywords cover.
pub fn match_keywords(user: &BTreeSet<String>, reference: &BTreeSet<String>) -> KeywordMatch {
    let matched: BTreeSet<String> = user.intersection(reference).cloned().collect();
    let missing: BTreeSet<String> = reference.difference(user).cloned().collect();

    let score = percent(matched.len(), reference.len());

    KeywordMatch {
        score,
        band: FeedbackBand::from_score(score),
        matched,
        missing,
    }
}

/// Coverage of required literal fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCheck {
    pub found: Vec<String>,
    pub missing: Vec<String>,
    pub score: u8,
}

/// Check which `patterns` occur (case-insensitively) in the normalized answer.
pub fn check_patterns(user: &str, patterns: &[String]) -> PatternCheck {
    let normalized = normalize(user);
    let (found, missing): (Vec<String>, Vec<String>) = patterns
        .iter()
        .cloned()
        .partition(|p| normalized.contains(&p.to_lowercase()));

    let score = percent(found.len(), patterns.len());
    PatternCheck {
        found,
        missing,
        score,
    }
}

/// `round(100 * part / whole)`, or 0 when `whole` is 0.
pub(crate) fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}
