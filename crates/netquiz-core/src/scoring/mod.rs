//! Heuristic scoring of free-text code answers.
//!
//! A submission is compared against a reference solution two ways: an edit
//! distance over normalized text, and keyword coverage. The two are combined
//! with fixed weights into a single 0–100 score. Nothing is executed.

pub mod keywords;
pub mod normalize;
pub mod similarity;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use keywords::{check_patterns, extract_keywords, match_keywords, FeedbackBand, PatternCheck};
pub use normalize::normalize;
pub use similarity::{edit_distance, similarity};

/// Weight of the similarity component in the combined score.
pub const SIMILARITY_WEIGHT: f64 = 0.4;
/// Weight of the keyword component in the combined score.
pub const KEYWORD_WEIGHT: f64 = 0.6;

pub const NO_CODE_FEEDBACK: &str = "No code submitted.";
const VERY_CLOSE_FEEDBACK: &str = "Excellent! Your solution is very close to the expected answer.";
const STRONG_FEEDBACK: &str = "Good! Your solution shows strong understanding.";

/// Score and feedback for one code answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeScore {
    pub score: u8,
    pub feedback: String,
    pub matched_keywords: BTreeSet<String>,
    pub missing_keywords: BTreeSet<String>,
}

impl CodeScore {
    fn empty() -> Self {
        Self {
            score: 0,
            feedback: NO_CODE_FEEDBACK.to_string(),
            matched_keywords: BTreeSet::new(),
            missing_keywords: BTreeSet::new(),
        }
    }
}

/// Score a code answer against its reference solution.
pub fn score_code(user: &str, reference: &str) -> CodeScore {
    if user.trim().is_empty() {
        return CodeScore::empty();
    }

    let similarity = similarity(user, reference);
    let keywords = match_keywords(&extract_keywords(user), &extract_keywords(reference));

    let combined =
        f64::from(similarity) * SIMILARITY_WEIGHT + f64::from(keywords.score) * KEYWORD_WEIGHT;
    let score = combined.round().clamp(0.0, 100.0) as u8;

    let feedback = if similarity > 80 {
        VERY_CLOSE_FEEDBACK
    } else if similarity > 60 {
        STRONG_FEEDBACK
    } else {
        keywords.band.message()
    };

    tracing::debug!(similarity, keyword_score = keywords.score, score, "scored code answer");

    CodeScore {
        score,
        feedback: feedback.to_string(),
        matched_keywords: keywords.matched,
        missing_keywords: keywords.missing,
    }
}
