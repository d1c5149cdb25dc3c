//! Template parameters for email-style report delivery.

use chrono::{DateTime, Utc};
use serde::Serialize;

use netquiz_core::model::QuestionKind;
use netquiz_core::results::QuestionOutcome;
use netquiz_core::traits::{Notification, NotificationPayload};

/// Variables substituted into a delivery template. Every field is always
/// present; fields that do not apply to the report kind are zero or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub to_email: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub notification_type: String,
    pub score: usize,
    pub total_questions: usize,
    pub percentage: u8,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub completion_time: String,
    pub termination_reason: String,
    pub termination_time: String,
    pub questions_answered: usize,
    pub partial_score: u8,
    pub detailed_results: String,
    pub message: String,
}

/// Build template parameters for `notification`, addressed to `recipient`.
pub fn render_params(notification: &Notification, recipient: &str) -> TemplateParams {
    let candidate = &notification.candidate;
    let when = format_timestamp(&notification.timestamp);

    let mut params = TemplateParams {
        to_email: recipient.to_string(),
        candidate_name: candidate.name.clone(),
        candidate_email: candidate.email.clone(),
        notification_type: notification.kind().to_string(),
        score: 0,
        total_questions: notification.total_questions,
        percentage: 0,
        correct_answers: 0,
        incorrect_answers: 0,
        completion_time: String::new(),
        termination_reason: String::new(),
        termination_time: String::new(),
        questions_answered: 0,
        partial_score: 0,
        detailed_results: format_detailed_results(&notification.detailed_results),
        message: String::new(),
    };

    match &notification.payload {
        NotificationPayload::Completion {
            score,
            percentage,
            correct_answers,
            incorrect_answers,
        } => {
            params.score = *score;
            params.percentage = *percentage;
            params.correct_answers = *correct_answers;
            params.incorrect_answers = *incorrect_answers;
            params.completion_time = when;
            params.message = format!(
                "Quiz completed by {}. Score: {}% ({}/{})",
                candidate.name, percentage, score, notification.total_questions
            );
        }
        NotificationPayload::Termination {
            reason,
            questions_answered,
            partial_score,
        } => {
            params.termination_reason = reason.clone();
            params.termination_time = when;
            params.questions_answered = *questions_answered;
            params.partial_score = *partial_score;
            params.message = format!("Quiz terminated for {}. Reason: {}", candidate.name, reason);
        }
    }

    params
}

/// Human-readable timestamp, e.g. `October 19, 2026, 09:15:02 AM UTC`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%B %-d, %Y, %I:%M:%S %p UTC").to_string()
}

/// Plain-text listing of per-question outcomes.
pub fn format_detailed_results(results: &[QuestionOutcome]) -> String {
    if results.is_empty() {
        return "No detailed results available.".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let mut text = format!("\n{}. {}\n", i + 1, result.prompt);
            text.push_str(&format!("   Category: {}\n", result.category));
            text.push_str(&format!("   Type: {}\n", result.kind));
            text.push_str(&format!(
                "   Status: {}\n",
                if result.is_correct { "✓ Correct" } else { "✗ Incorrect" }
            ));

            match (&result.code_score, result.kind) {
                (Some(code), QuestionKind::Coding) => {
                    text.push_str(&format!("   Code Score: {}%\n", code.score));
                    text.push_str(&format!("   Feedback: {}\n", code.feedback));
                    if !code.matched_keywords.is_empty() {
                        text.push_str(&format!(
                            "   Matched Keywords: {}\n",
                            join(&code.matched_keywords)
                        ));
                    }
                    if !code.missing_keywords.is_empty() {
                        text.push_str(&format!(
                            "   Missing Keywords: {}\n",
                            join(&code.missing_keywords)
                        ));
                    }
                }
                _ => {
                    text.push_str(&format!(
                        "   User Answer: {}\n",
                        or_placeholder(&result.user_answer, "No answer")
                    ));
                    text.push_str(&format!(
                        "   Correct Answer: {}\n",
                        or_placeholder(&result.correct_answer, "N/A")
                    ));
                }
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use netquiz_core::integrity::TerminationReport;
    use netquiz_core::results::QuizResult;
    use netquiz_core::scoring::score_code;
    use netquiz_core::traits::Candidate;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 2).unwrap()
    }

    fn candidate() -> Candidate {
        Candidate {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    fn choice_outcome(correct: bool, user: &str) -> QuestionOutcome {
        QuestionOutcome {
            question_id: 1,
            prompt: "Which layer routes packets?".into(),
            category: "OSI".into(),
            kind: QuestionKind::Single,
            is_correct: correct,
            score: if correct { 100 } else { 0 },
            user_answer: user.into(),
            correct_answer: "Network".into(),
            code_score: None,
            requirements: None,
        }
    }

    #[test]
    fn completion_params() {
        let result = QuizResult {
            total_questions: 40,
            correct_answers: 30,
            incorrect_answers: 10,
            percentage: 72,
            details: vec![choice_outcome(true, "Network")],
        };
        let n = Notification::completion(candidate(), &result, at());
        let params = render_params(&n, "hr@example.com");

        assert_eq!(params.to_email, "hr@example.com");
        assert_eq!(params.notification_type, "completion");
        assert_eq!(params.score, 30);
        assert_eq!(params.percentage, 72);
        assert_eq!(params.completion_time, "October 19, 2026, 09:15:02 AM UTC");
        assert!(params.termination_time.is_empty());
        assert_eq!(params.message, "Quiz completed by Ada. Score: 72% (30/40)");
        assert!(params.detailed_results.contains("1. Which layer routes packets?"));
        assert!(params.detailed_results.contains("Status: ✓ Correct"));
    }

    #[test]
    fn termination_params() {
        let report = TerminationReport {
            reason: "You switched tabs.".into(),
            questions_answered: 4,
            total_questions: 40,
            partial_score: 10,
            at: 0,
        };
        let n = Notification::termination(candidate(), &report, at());
        let params = render_params(&n, "hr@example.com");

        assert_eq!(params.notification_type, "termination");
        assert_eq!(params.termination_reason, "You switched tabs.");
        assert_eq!(params.questions_answered, 4);
        assert_eq!(params.partial_score, 10);
        assert_eq!(params.score, 0);
        assert_eq!(params.detailed_results, "No detailed results available.");
        assert_eq!(params.message, "Quiz terminated for Ada. Reason: You switched tabs.");
    }

    #[test]
    fn detailed_results_listing() {
        let code = score_code("import socket", "import socket\nsock.bind(addr)");
        let coding = QuestionOutcome {
            question_id: 2,
            prompt: "Bind a socket".into(),
            category: "Sockets".into(),
            kind: QuestionKind::Coding,
            is_correct: false,
            score: code.score,
            user_answer: "import socket".into(),
            correct_answer: "import socket\nsock.bind(addr)".into(),
            code_score: Some(code),
            requirements: None,
        };
        let text = format_detailed_results(&[choice_outcome(false, ""), coding]);

        assert!(text.starts_with("\n1. Which layer routes packets?\n"));
        assert!(text.contains("   User Answer: No answer\n"));
        assert!(text.contains("   Correct Answer: Network\n"));
        assert!(text.contains("\n2. Bind a socket\n"));
        assert!(text.contains("   Type: coding\n"));
        assert!(text.contains("   Matched Keywords: "));
        assert!(text.contains("   Missing Keywords: "));
        assert!(text.contains("bind"));
    }
}
