//! Quiz session state machine.
//!
//! The [`SessionController`] owns the candidate's progress and writes it to a
//! [`KeyValueStore`] after every change. Storage problems never reach the
//! caller: they are logged and the controller carries on in memory.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{PersistenceError, SessionError};
use crate::model::{Question, QuestionBank, QuestionId, QuestionKind};
use crate::results::{compute_result, QuizResult};
use crate::store::{load_json, save_json, KeyValueStore, SESSION_KEY, STARTED_AT_KEY};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// One candidate's answers and position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub current_index: usize,
    pub choice_answers: BTreeMap<QuestionId, BTreeSet<usize>>,
    pub code_answers: BTreeMap<QuestionId, String>,
    pub completed: bool,
    /// Epoch milliseconds; set once when the session starts.
    pub started_at: Option<u64>,
}

impl Session {
    /// Questions with any stored answer.
    pub fn answered_count(&self) -> usize {
        self.choice_answers.len() + self.code_answers.len()
    }
}

/// Persisted form of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionSnapshot {
    pub current_question_index: usize,
    pub answers: BTreeMap<QuestionId, Vec<usize>>,
    pub code_answers: BTreeMap<QuestionId, String>,
    pub is_completed: bool,
    pub total_questions: usize,
}

impl SessionSnapshot {
    pub fn from_session(session: &Session, total_questions: usize) -> Self {
        Self {
            current_question_index: session.current_index,
            answers: session
                .choice_answers
                .iter()
                .map(|(id, set)| (*id, set.iter().copied().collect()))
                .collect(),
            code_answers: session.code_answers.clone(),
            is_completed: session.completed,
            total_questions,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len() + self.code_answers.len()
    }

    /// Read the raw snapshot without checking it against a bank.
    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, PersistenceError> {
        load_json(store, SESSION_KEY)
    }

    /// Check the snapshot against `bank` and rebuild the session.
    pub fn into_session(self, bank: &QuestionBank) -> Result<Session, PersistenceError> {
        let malformed = |reason: String| PersistenceError::Malformed {
            key: SESSION_KEY.to_string(),
            reason,
        };

        if self.total_questions != bank.len() {
            return Err(malformed(format!(
                "snapshot is for {} questions, bank has {}",
                self.total_questions,
                bank.len()
            )));
        }
        if self.current_question_index >= bank.len().max(1) {
            return Err(malformed(format!(
                "current index {} out of range",
                self.current_question_index
            )));
        }

        let mut choice_answers = BTreeMap::new();
        for (id, indices) in self.answers {
            let question = bank
                .get(id)
                .filter(|q| q.choices().is_some())
                .ok_or_else(|| malformed(format!("choice answer for unknown question {id}")))?;
            let options = question.choices().map_or(0, |c| c.options.len());
            if question.kind() == QuestionKind::Single && indices.len() > 1 {
                return Err(malformed(format!(
                    "{} options selected on single-choice question {id}",
                    indices.len()
                )));
            }
            if let Some(bad) = indices.iter().find(|&&i| i >= options) {
                return Err(malformed(format!(
                    "option {bad} out of range for question {id}"
                )));
            }
            if !indices.is_empty() {
                choice_answers.insert(id, indices.into_iter().collect());
            }
        }

        for id in self.code_answers.keys() {
            if bank.get(*id).map(Question::kind) != Some(QuestionKind::Coding) {
                return Err(malformed(format!(
                    "code answer for unknown question {id}"
                )));
            }
        }

        Ok(Session {
            current_index: self.current_question_index,
            choice_answers,
            code_answers: self.code_answers,
            completed: self.is_completed,
            started_at: None,
        })
    }
}

/// Returns `true` when the store holds an unfinished session with at least
/// one answer, i.e. the candidate can resume.
pub fn has_saved_progress(store: &dyn KeyValueStore, bank: &QuestionBank) -> bool {
    match SessionSnapshot::load(store).and_then(|s| s.map(|s| s.into_session(bank)).transpose()) {
        Ok(Some(session)) => !session.completed && session.answered_count() > 0,
        Ok(None) => false,
        Err(e) => {
            tracing::warn!("ignoring saved session: {e}");
            false
        }
    }
}

/// Drives one session over a fixed question bank.
pub struct SessionController {
    bank: Arc<QuestionBank>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    session: Session,
    state: SessionState,
    load_warning: Option<PersistenceError>,
}

impl SessionController {
    pub fn new(
        bank: Arc<QuestionBank>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bank,
            store,
            clock,
            session: Session::default(),
            state: SessionState::NotStarted,
            load_warning: None,
        }
    }

    /// Resume the persisted session if it is unfinished, otherwise begin a
    /// fresh one. Calling this on a started controller does nothing.
    pub fn start(&mut self) {
        if self.state != SessionState::NotStarted {
            return;
        }

        let resumed = match SessionSnapshot::load(self.store.as_ref())
            .and_then(|s| s.map(|s| s.into_session(&self.bank)).transpose())
        {
            Ok(Some(session)) if !session.completed => Some(session),
            Ok(Some(_)) => {
                tracing::debug!("previous session completed, starting fresh");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("failed to restore session, starting fresh: {e}");
                self.load_warning = Some(e);
                None
            }
        };

        let is_resume = resumed.is_some();
        self.session = resumed.unwrap_or_default();

        let stored_start = if is_resume {
            match load_json::<u64>(self.store.as_ref(), STARTED_AT_KEY) {
                Ok(start) => start,
                Err(e) => {
                    tracing::warn!("ignoring stored start time: {e}");
                    None
                }
            }
        } else {
            None
        };

        let started_at = match stored_start {
            Some(start) => start,
            None => {
                let now = self.clock.now_ms();
                if let Err(e) = save_json(self.store.as_ref(), STARTED_AT_KEY, &now) {
                    tracing::warn!("failed to persist start time: {e}");
                }
                now
            }
        };
        self.session.started_at = Some(started_at);
        self.state = SessionState::InProgress;

        tracing::info!(
            resumed = is_resume,
            index = self.session.current_index,
            answered = self.session.answered_count(),
            "session started"
        );
        self.persist();
    }

    /// Select an option. Single-choice questions replace the selection;
    /// multi-choice questions toggle the option.
    pub fn select_choice(
        &mut self,
        question_id: QuestionId,
        option: usize,
    ) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let question = self.lookup(question_id)?;
        let kind = question.kind();
        let available = question
            .choices()
            .map(|c| c.options.len())
            .ok_or(SessionError::NotAChoiceQuestion(question_id))?;
        if option >= available {
            return Err(SessionError::OptionOutOfRange {
                question: question_id,
                option,
                available,
            });
        }

        match kind {
            QuestionKind::Single => {
                self.session
                    .choice_answers
                    .insert(question_id, BTreeSet::from([option]));
            }
            _ => {
                let selected = self.session.choice_answers.entry(question_id).or_default();
                if !selected.remove(&option) {
                    selected.insert(option);
                }
                if selected.is_empty() {
                    self.session.choice_answers.remove(&question_id);
                }
            }
        }

        tracing::debug!(question = question_id, option, "choice updated");
        self.persist();
        Ok(())
    }

    /// Store a code answer verbatim.
    pub fn set_code_answer(
        &mut self,
        question_id: QuestionId,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if self.lookup(question_id)?.kind() != QuestionKind::Coding {
            return Err(SessionError::NotACodingQuestion(question_id));
        }
        self.session.code_answers.insert(question_id, text.into());
        tracing::debug!(question = question_id, "code answer updated");
        self.persist();
        Ok(())
    }

    /// Move to the next question, completing the session after the last
    /// one. Does nothing once completed. Answer gating is left to the
    /// caller; see [`SessionController::current_has_answer`].
    pub fn advance(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => return Err(SessionError::NotStarted),
            SessionState::Completed => return Ok(()),
            SessionState::InProgress => {}
        }

        if self.session.current_index + 1 >= self.bank.len() {
            self.complete();
        } else {
            self.session.current_index += 1;
        }
        self.persist();
        Ok(())
    }

    /// Move to the previous question, stopping at the first.
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => return Err(SessionError::NotStarted),
            SessionState::Completed => return Ok(()),
            SessionState::InProgress => {}
        }
        self.session.current_index = self.session.current_index.saturating_sub(1);
        self.persist();
        Ok(())
    }

    /// Complete the session regardless of position.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Completed => Ok(()),
            SessionState::InProgress => {
                self.complete();
                self.persist();
                Ok(())
            }
        }
    }

    /// Mark the session completed after a forced termination. Nothing is
    /// persisted, since termination wipes the store.
    pub fn terminate(&mut self) {
        if self.state != SessionState::Completed {
            self.complete();
        }
    }

    /// Clear persisted progress and begin again at the first question.
    pub fn reset(&mut self) {
        for key in [SESSION_KEY, STARTED_AT_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("failed to clear '{key}': {e}");
            }
        }

        let now = self.clock.now_ms();
        if let Err(e) = save_json(self.store.as_ref(), STARTED_AT_KEY, &now) {
            tracing::warn!("failed to persist start time: {e}");
        }
        self.session = Session {
            started_at: Some(now),
            ..Session::default()
        };
        self.state = SessionState::InProgress;
        self.load_warning = None;
        tracing::info!("session reset");
        self.persist();
    }

    /// Score the session as it stands.
    pub fn compute_result(&self) -> QuizResult {
        compute_result(&self.bank, &self.session)
    }

    /// Whether the current question has a non-blank answer.
    pub fn current_has_answer(&self) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        match question.kind() {
            QuestionKind::Coding => self
                .session
                .code_answers
                .get(&question.id)
                .is_some_and(|code| !code.trim().is_empty()),
            _ => self
                .session
                .choice_answers
                .get(&question.id)
                .is_some_and(|selected| !selected.is_empty()),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.bank.at(self.session.current_index)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_session(&self.session, self.bank.len())
    }

    /// The problem encountered while restoring persisted state, if any.
    pub fn load_warning(&self) -> Option<&PersistenceError> {
        self.load_warning.as_ref()
    }

    fn complete(&mut self) {
        self.session.completed = true;
        self.state = SessionState::Completed;
        tracing::info!(answered = self.session.answered_count(), "session completed");
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Completed => Err(SessionError::AlreadyCompleted),
            SessionState::InProgress => Ok(()),
        }
    }

    fn lookup(&self, question_id: QuestionId) -> Result<&Question, SessionError> {
        self.bank.get(question_id).ok_or_else(|| {
            tracing::error!(question = question_id, "answer references unknown question");
            SessionError::UnknownQuestion(question_id)
        })
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), SESSION_KEY, &self.snapshot()) {
            tracing::warn!("failed to persist session: {e}");
        }
    }
}
