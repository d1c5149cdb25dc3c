//! Notification gateway contract.
//!
//! Gateways are implemented by the `netquiz-notify` crate. The core only
//! builds [`Notification`]s and hands them to a gateway through the
//! rate-limited [`crate::notifier::Notifier`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NotificationError;
use crate::integrity::TerminationReport;
use crate::results::{QuestionOutcome, QuizResult};

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// A delivery channel for completion and termination reports.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Human-readable gateway name (e.g. "emailjs").
    fn name(&self) -> &str;

    /// Deliver one report.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Kind of report. Rate limits are tracked per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Completion,
    Termination,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Completion => "completion",
            NotificationKind::Termination => "termination",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who took the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub name: String,
    pub email: String,
}

impl Default for Candidate {
    fn default() -> Self {
        Self {
            name: "Unknown Candidate".to_string(),
            email: "Not provided".to_string(),
        }
    }
}

/// Kind-specific report content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationPayload {
    Completion {
        /// Number of correct answers.
        score: usize,
        percentage: u8,
        correct_answers: usize,
        incorrect_answers: usize,
    },
    Termination {
        reason: String,
        questions_answered: usize,
        partial_score: u8,
    },
}

/// A report handed to a [`NotificationGateway`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub candidate: Candidate,
    pub total_questions: usize,
    pub timestamp: DateTime<Utc>,
    pub payload: NotificationPayload,
    #[serde(default)]
    pub detailed_results: Vec<QuestionOutcome>,
}

impl Notification {
    /// Report for a finished quiz.
    pub fn completion(candidate: Candidate, result: &QuizResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            total_questions: result.total_questions,
            timestamp,
            payload: NotificationPayload::Completion {
                score: result.correct_answers,
                percentage: result.percentage,
                correct_answers: result.correct_answers,
                incorrect_answers: result.incorrect_answers,
            },
            detailed_results: result.details.clone(),
        }
    }

    /// Report for a run stopped by the integrity monitor.
    pub fn termination(
        candidate: Candidate,
        report: &TerminationReport,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            total_questions: report.total_questions,
            timestamp,
            payload: NotificationPayload::Termination {
                reason: report.reason.clone(),
                questions_answered: report.questions_answered,
                partial_score: report.partial_score,
            },
            detailed_results: Vec::new(),
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self.payload {
            NotificationPayload::Completion { .. } => NotificationKind::Completion,
            NotificationPayload::Termination { .. } => NotificationKind::Termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> QuizResult {
        QuizResult {
            total_questions: 4,
            correct_answers: 3,
            incorrect_answers: 1,
            percentage: 71,
            details: vec![],
        }
    }

    #[test]
    fn completion_uses_correct_count_as_score() {
        let n = Notification::completion(Candidate::default(), &result(), Utc::now());
        assert_eq!(n.kind(), NotificationKind::Completion);
        assert_eq!(
            n.payload,
            NotificationPayload::Completion {
                score: 3,
                percentage: 71,
                correct_answers: 3,
                incorrect_answers: 1,
            }
        );
    }

    #[test]
    fn termination_carries_progress() {
        let report = TerminationReport {
            reason: "left the page".into(),
            questions_answered: 5,
            total_questions: 40,
            partial_score: 13,
            at: 0,
        };
        let n = Notification::termination(Candidate::default(), &report, Utc::now());
        assert_eq!(n.kind(), NotificationKind::Termination);
        assert_eq!(n.total_questions, 40);
        assert!(n.detailed_results.is_empty());
    }

    #[test]
    fn payload_is_tagged_by_type() {
        let n = Notification::completion(Candidate::default(), &result(), Utc::now());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["payload"]["type"], "completion");
        assert_eq!(json["candidate"]["name"], "Unknown Candidate");
        assert_eq!(NotificationKind::Termination.to_string(), "termination");
    }
}
