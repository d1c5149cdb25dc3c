pub mod answer;
pub mod code;
pub mod finish;
pub mod init;
pub mod navigate;
pub mod obfuscate;
pub mod reset;
pub mod result;
pub mod score;
pub mod signal;
pub mod start;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use netquiz_core::clock::{Clock, SystemClock};
use netquiz_core::model::{QuestionBank, QuestionKind};
use netquiz_core::notifier::{DispatchOutcome, Notifier};
use netquiz_core::ratelimit::RateLimiter;
use netquiz_core::session::{SessionController, SessionSnapshot};
use netquiz_core::store::{FileStore, KeyValueStore};
use netquiz_core::traits::Notification;
use netquiz_notify::{create_gateway, load_config_from, QuizConfig};

/// Everything a session command needs: config, bank, state store and clock.
pub struct Workspace {
    pub config: QuizConfig,
    pub bank: Arc<QuestionBank>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

impl Workspace {
    pub fn open(config_path: Option<PathBuf>, bank_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let bank_path = resolve_bank_path(&config, bank_path)?;
        let bank = netquiz_core::parser::parse_bank(&bank_path)?;
        if bank.is_empty() {
            anyhow::bail!("question bank {} has no questions", bank_path.display());
        }
        netquiz_core::parser::ensure_playable(&bank)?;

        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.state_dir));
        tracing::debug!(
            bank = %bank.id,
            state_dir = %config.state_dir.display(),
            "workspace opened"
        );

        Ok(Self {
            config,
            bank: Arc::new(bank),
            store,
            clock: Arc::new(SystemClock),
        })
    }

    /// A controller that has not been started yet.
    pub fn controller(&self) -> SessionController {
        SessionController::new(self.bank.clone(), self.store.clone(), self.clock.clone())
    }

    /// Resume the unfinished session, refusing when there is none.
    pub fn resume(&self) -> Result<SessionController> {
        let snapshot = SessionSnapshot::load(self.store.as_ref())
            .context("failed to read saved session")?;
        match snapshot {
            None => anyhow::bail!("no assessment in progress; run `netquiz start` first"),
            Some(s) if s.is_completed => anyhow::bail!(
                "the assessment is already completed; run `netquiz result` or `netquiz reset`"
            ),
            Some(s) => {
                s.into_session(&self.bank)
                    .context("saved session does not match the question bank")?;
            }
        }

        let mut controller = self.controller();
        controller.start();
        Ok(controller)
    }

    /// A notifier routed through the configured gateway.
    pub fn notifier(&self, session_started_at: Option<u64>) -> Result<Notifier> {
        let gateway = create_gateway(&self.config.gateway)?;
        let mut limiter = RateLimiter::new(
            self.config.rate_limit.clone(),
            self.store.clone(),
            self.clock.clone(),
        );
        if let Some(started_at) = session_started_at {
            limiter = limiter.with_session_start(started_at);
        }
        Ok(Notifier::new(gateway, Arc::new(limiter)))
    }

    /// Dispatch `notification` and describe what happened.
    pub async fn notify(
        &self,
        notification: &Notification,
        session_started_at: Option<u64>,
    ) -> Result<()> {
        let notifier = self.notifier(session_started_at)?;
        match notifier.dispatch(notification).await {
            DispatchOutcome::Sent => println!("Sent {} report.", notification.kind()),
            DispatchOutcome::Suppressed(denial) => {
                println!("{} report not sent: {denial}", notification.kind())
            }
            DispatchOutcome::Failed(e) => {
                eprintln!("Warning: failed to send {} report: {e}", notification.kind())
            }
        }
        Ok(())
    }
}

fn resolve_bank_path(config: &QuizConfig, bank: Option<PathBuf>) -> Result<PathBuf> {
    bank.or_else(|| config.question_bank.clone()).ok_or_else(|| {
        anyhow::anyhow!("no question bank given; pass --bank or set `question_bank` in netquiz.toml")
    })
}

/// Print the current question with its options or code answer.
pub fn print_current(controller: &SessionController) {
    let Some(question) = controller.current_question() else {
        return;
    };
    let session = controller.session();
    let total = controller.bank().len();

    println!(
        "Question {}/{} [{}] ({})",
        session.current_index + 1,
        total,
        question.category,
        question.kind()
    );
    println!("{}", question.prompt);

    match question.kind() {
        QuestionKind::Coding => {
            let coding = question.coding();
            let language = coding.map(|c| c.language.as_str()).unwrap_or_default();
            match session.code_answers.get(&question.id) {
                Some(code) if !code.trim().is_empty() => {
                    println!("\nYour answer ({language}):\n{code}");
                }
                _ => {
                    let placeholder = coding.map(|c| c.placeholder.as_str()).unwrap_or_default();
                    println!("\nNo answer yet ({language}). Submit one with `netquiz code`.");
                    if !placeholder.is_empty() {
                        println!("{placeholder}");
                    }
                }
            }
        }
        kind => {
            let selected = session.choice_answers.get(&question.id);
            let options = question.choices().map(|c| c.options.len()).unwrap_or(0);
            println!();
            for index in 0..options {
                let mark = if selected.is_some_and(|s| s.contains(&index)) {
                    "x"
                } else {
                    " "
                };
                println!("  [{mark}] {}. {}", index + 1, question.option_label(index));
            }
            if kind == QuestionKind::Multiple {
                println!("\nSelect all that apply.");
            }
        }
    }
}
