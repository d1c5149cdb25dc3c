//! Notification rate limiting.
//!
//! Two layers of limits apply: a persisted send history (hourly cap,
//! survives restarts) and an in-memory ledger for the current session
//! (cooldown, minimum session time, one report per kind). Checking and
//! recording happen under one lock, so overlapping dispatches cannot both
//! pass the same check.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;
use crate::store::{load_json, save_json, KeyValueStore, NOTIFICATION_HISTORY_KEY};
use crate::traits::NotificationKind;

const HOUR_MS: u64 = 60 * 60 * 1000;

/// Limits applied to outgoing reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Minimum gap between two sends in one session.
    pub cooldown_ms: u64,
    /// Sends allowed in any rolling hour, across sessions.
    pub max_per_hour: usize,
    /// Termination reports are refused this soon after the session starts.
    pub min_session_time_ms: u64,
    pub once_per_kind_per_session: bool,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            cooldown_ms: 30_000,
            max_per_hour: 2,
            min_session_time_ms: 10_000,
            once_per_kind_per_session: true,
        }
    }
}

/// One persisted send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Epoch milliseconds.
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// Why a send was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitDenial {
    #[error("hourly notification limit exceeded ({limit} per hour), try again in {retry_in_minutes} minutes")]
    HourlyLimit { limit: usize, retry_in_minutes: u64 },

    #[error("notification cooldown active ({remaining_secs}s remaining)")]
    Cooldown { remaining_secs: u64 },

    #[error("minimum quiz time not reached ({remaining_secs}s remaining)")]
    SessionTooShort { remaining_secs: u64 },

    #[error("{0} notification already sent this session")]
    AlreadySent(NotificationKind),
}

/// Proof that a send was recorded. Hand it back to
/// [`RateLimiter::release`] if delivery fails.
#[derive(Debug)]
#[must_use = "a permit should be released if delivery fails"]
pub struct Permit {
    kind: NotificationKind,
    timestamp: u64,
    previous_sent_at: Option<u64>,
}

impl Permit {
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }
}

/// Snapshot of the limiter for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatus {
    pub recent: Vec<NotificationRecord>,
    pub can_send_completion: bool,
    pub can_send_termination: bool,
    pub time_until_next_ms: u64,
}

#[derive(Debug)]
struct SessionLedger {
    started_at: u64,
    last_sent_at: Option<u64>,
    sent: HashSet<NotificationKind>,
}

impl SessionLedger {
    fn new(started_at: u64) -> Self {
        Self {
            started_at,
            last_sent_at: None,
            sent: HashSet::new(),
        }
    }
}

/// Rate limiter with a persisted history and a per-session ledger.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    session: Mutex<SessionLedger>,
}

impl RateLimiter {
    /// A limiter whose session starts now.
    pub fn new(
        policy: RateLimitPolicy,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let started_at = clock.now_ms();
        Self {
            policy,
            store,
            clock,
            session: Mutex::new(SessionLedger::new(started_at)),
        }
    }

    /// Treat `started_at` as the session start.
    pub fn with_session_start(self, started_at: u64) -> Self {
        self.ledger().started_at = started_at;
        self
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check every limit for `kind` and, if all pass, record the send.
    pub fn try_acquire(&self, kind: NotificationKind) -> Result<Permit, RateLimitDenial> {
        let mut ledger = self.ledger();
        let now = self.clock.now_ms();
        let mut history = self.recent_history(now);

        self.check(&ledger, &history, kind, now)?;

        history.push(NotificationRecord {
            timestamp: now,
            kind,
        });
        self.save_history(&history);

        let previous_sent_at = ledger.last_sent_at.replace(now);
        ledger.sent.insert(kind);
        tracing::debug!(%kind, "notification send recorded");

        Ok(Permit {
            kind,
            timestamp: now,
            previous_sent_at,
        })
    }

    /// Undo the record made by [`RateLimiter::try_acquire`].
    pub fn release(&self, permit: Permit) {
        let mut ledger = self.ledger();
        let mut history = self.recent_history(self.clock.now_ms());
        if let Some(pos) = history
            .iter()
            .rposition(|r| r.timestamp == permit.timestamp && r.kind == permit.kind)
        {
            history.remove(pos);
            self.save_history(&history);
        }

        if ledger.last_sent_at == Some(permit.timestamp) {
            ledger.last_sent_at = permit.previous_sent_at;
        }
        ledger.sent.remove(&permit.kind);
        tracing::debug!(kind = %permit.kind, "notification send released");
    }

    /// Start a new session: clears the cooldown and per-kind caps.
    pub fn reset_session(&self) {
        *self.ledger() = SessionLedger::new(self.clock.now_ms());
    }

    /// Forget every persisted send.
    pub fn clear_history(&self) {
        match self.store.remove(NOTIFICATION_HISTORY_KEY) {
            Ok(()) => tracing::info!("notification history cleared"),
            Err(e) => tracing::warn!("failed to clear notification history: {e}"),
        }
    }

    pub fn status(&self) -> RateLimitStatus {
        let ledger = self.ledger();
        let now = self.clock.now_ms();
        let recent = self.recent_history(now);
        let time_until_next_ms = ledger
            .last_sent_at
            .map(|last| self.policy.cooldown_ms.saturating_sub(now.saturating_sub(last)))
            .unwrap_or(0);

        RateLimitStatus {
            can_send_completion: self
                .check(&ledger, &recent, NotificationKind::Completion, now)
                .is_ok(),
            can_send_termination: self
                .check(&ledger, &recent, NotificationKind::Termination, now)
                .is_ok(),
            time_until_next_ms,
            recent,
        }
    }

    fn check(
        &self,
        ledger: &SessionLedger,
        recent: &[NotificationRecord],
        kind: NotificationKind,
        now: u64,
    ) -> Result<(), RateLimitDenial> {
        if recent.len() >= self.policy.max_per_hour {
            let oldest = recent.iter().map(|r| r.timestamp).min().unwrap_or(now);
            let expires_in = HOUR_MS.saturating_sub(now.saturating_sub(oldest));
            return Err(RateLimitDenial::HourlyLimit {
                limit: self.policy.max_per_hour,
                retry_in_minutes: expires_in.div_ceil(60_000),
            });
        }

        if let Some(last) = ledger.last_sent_at {
            let since = now.saturating_sub(last);
            if since < self.policy.cooldown_ms {
                return Err(RateLimitDenial::Cooldown {
                    remaining_secs: (self.policy.cooldown_ms - since).div_ceil(1_000),
                });
            }
        }

        if kind == NotificationKind::Termination {
            let since = now.saturating_sub(ledger.started_at);
            if since < self.policy.min_session_time_ms {
                return Err(RateLimitDenial::SessionTooShort {
                    remaining_secs: (self.policy.min_session_time_ms - since).div_ceil(1_000),
                });
            }
        }

        if self.policy.once_per_kind_per_session && ledger.sent.contains(&kind) {
            return Err(RateLimitDenial::AlreadySent(kind));
        }

        Ok(())
    }

    /// Persisted history minus entries older than an hour. Pruned entries
    /// are written back.
    fn recent_history(&self, now: u64) -> Vec<NotificationRecord> {
        let history: Vec<NotificationRecord> =
            match load_json(self.store.as_ref(), NOTIFICATION_HISTORY_KEY) {
                Ok(history) => history.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("failed to load notification history: {e}");
                    Vec::new()
                }
            };

        let total = history.len();
        let recent: Vec<NotificationRecord> = history
            .into_iter()
            .filter(|r| now.saturating_sub(r.timestamp) < HOUR_MS)
            .collect();
        if recent.len() != total {
            self.save_history(&recent);
        }
        recent
    }

    fn save_history(&self, history: &[NotificationRecord]) {
        if let Err(e) = save_json(self.store.as_ref(), NOTIFICATION_HISTORY_KEY, &history) {
            tracing::warn!("failed to save notification history: {e}");
        }
    }

    fn ledger(&self) -> MutexGuard<'_, SessionLedger> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
