//! Integrity monitor: turns environment signals into warnings or a one-shot
//! termination of the assessment.
//!
//! Signals arrive as [`Observation`]s and are judged by pluggable
//! [`Detector`]s. Only a `Terminate` verdict can trip the monitor, and only
//! once: the latch is an atomic compare-exchange, so a visibility event and
//! a poll tick racing each other still produce a single report.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::session::SessionSnapshot;
use crate::store::KeyValueStore;

/// Reason reported when the candidate leaves the page.
pub const VISIBILITY_REASON: &str =
    "You switched to another tab (Alt+Tab) or minimized the browser during the assessment.";

/// Default gap in pixels between outer and inner window size that suggests
/// an inspection panel is open.
pub const DEFAULT_VIEWPORT_GAP_THRESHOLD: u32 = 160;

/// A single environment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The page became hidden or visible again.
    Visibility { hidden: bool },
    /// Window and viewport dimensions.
    Viewport {
        outer_width: u32,
        outer_height: u32,
        inner_width: u32,
        inner_height: u32,
    },
}

/// A detector's judgement of one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clear,
    Warn(String),
    Terminate(String),
}

/// Judges observations. Returns `None` for observations it does not handle.
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;
    fn inspect(&self, observation: &Observation) -> Option<Verdict>;
}

/// Terminates when the page is hidden. Becoming visible again is not a
/// signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisibilityDetector;

impl Detector for VisibilityDetector {
    fn name(&self) -> &str {
        "visibility"
    }

    fn inspect(&self, observation: &Observation) -> Option<Verdict> {
        match observation {
            Observation::Visibility { hidden: true } => {
                Some(Verdict::Terminate(VISIBILITY_REASON.to_string()))
            }
            Observation::Visibility { hidden: false } | Observation::Viewport { .. } => None,
        }
    }
}

/// Warns while the outer window is much larger than the viewport.
#[derive(Debug, Clone, Copy)]
pub struct ViewportGapDetector {
    pub threshold: u32,
}

impl Default for ViewportGapDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_VIEWPORT_GAP_THRESHOLD,
        }
    }
}

impl Detector for ViewportGapDetector {
    fn name(&self) -> &str {
        "viewport-gap"
    }

    fn inspect(&self, observation: &Observation) -> Option<Verdict> {
        let Observation::Viewport {
            outer_width,
            outer_height,
            inner_width,
            inner_height,
        } = *observation
        else {
            return None;
        };

        let width_gap = outer_width.saturating_sub(inner_width);
        let height_gap = outer_height.saturating_sub(inner_height);
        if width_gap > self.threshold || height_gap > self.threshold {
            Some(Verdict::Warn(format!(
                "developer tools appear to be open (gap {width_gap}x{height_gap}px)"
            )))
        } else {
            Some(Verdict::Clear)
        }
    }
}

/// Tuning for [`IntegrityMonitor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Termination is ignored until the monitor has been armed this long.
    pub min_dwell_ms: u64,
    pub viewport_gap_threshold: u32,
    /// Sampling period for [`spawn_viewport_poll`]. Only hosts that own a live
    /// window run the poll loop; the `netquiz signal` commands never read it.
    pub poll_interval_ms: u64,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            min_dwell_ms: 10_000,
            viewport_gap_threshold: DEFAULT_VIEWPORT_GAP_THRESHOLD,
            poll_interval_ms: 500,
        }
    }
}

impl IntegrityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Progress captured at the moment of termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationReport {
    pub reason: String,
    pub questions_answered: usize,
    pub total_questions: usize,
    /// Share of questions answered, as a percentage. Not the real score.
    pub partial_score: u8,
    /// Epoch milliseconds.
    pub at: u64,
}

/// What an observation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Nothing,
    Warning(String),
    WarningCleared,
    Terminated(TerminationReport),
}

/// One-shot integrity monitor for a single session.
pub struct IntegrityMonitor {
    config: IntegrityConfig,
    detectors: Vec<Box<dyn Detector>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    armed_at: AtomicU64,
    tripped: AtomicBool,
    warning: AtomicBool,
}

impl IntegrityMonitor {
    /// A monitor with the visibility and viewport-gap detectors, armed now.
    pub fn new(
        config: IntegrityConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(VisibilityDetector),
            Box::new(ViewportGapDetector {
                threshold: config.viewport_gap_threshold,
            }),
        ];
        let armed_at = clock.now_ms();
        Self {
            config,
            detectors,
            store,
            clock,
            armed_at: AtomicU64::new(armed_at),
            tripped: AtomicBool::new(false),
            warning: AtomicBool::new(false),
        }
    }

    /// Count the dwell time from `started_at` instead of construction time.
    pub fn armed_since(self, started_at: u64) -> Self {
        self.armed_at.store(started_at, Ordering::SeqCst);
        self
    }

    pub fn with_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    pub fn warning_active(&self) -> bool {
        self.warning.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    /// Run every detector over `observation`.
    ///
    /// A termination verdict wins over warnings. Before the dwell time has
    /// elapsed it is ignored and the monitor stays armed.
    pub fn observe(&self, observation: Observation) -> MonitorEvent {
        if self.is_tripped() {
            return MonitorEvent::Nothing;
        }

        let verdicts: Vec<Verdict> = self
            .detectors
            .iter()
            .filter_map(|d| {
                let verdict = d.inspect(&observation)?;
                tracing::trace!(detector = d.name(), ?verdict, "detector verdict");
                Some(verdict)
            })
            .collect();

        if let Some(reason) = verdicts.iter().find_map(|v| match v {
            Verdict::Terminate(reason) => Some(reason.clone()),
            _ => None,
        }) {
            return self.trip(reason);
        }

        if let Some(message) = verdicts.iter().find_map(|v| match v {
            Verdict::Warn(message) => Some(message.clone()),
            _ => None,
        }) {
            if !self.warning.swap(true, Ordering::SeqCst) {
                tracing::warn!("{message}");
                return MonitorEvent::Warning(message);
            }
            return MonitorEvent::Nothing;
        }

        let cleared = verdicts.iter().any(|v| *v == Verdict::Clear);
        if cleared && self.warning.swap(false, Ordering::SeqCst) {
            tracing::info!("integrity warning cleared");
            return MonitorEvent::WarningCleared;
        }
        MonitorEvent::Nothing
    }

    fn trip(&self, reason: String) -> MonitorEvent {
        let now = self.clock.now_ms();
        let armed_for = now.saturating_sub(self.armed_at.load(Ordering::SeqCst));
        if armed_for < self.config.min_dwell_ms {
            tracing::debug!(
                armed_for_ms = armed_for,
                min_dwell_ms = self.config.min_dwell_ms,
                "termination ignored during dwell time"
            );
            return MonitorEvent::Nothing;
        }

        if self
            .tripped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return MonitorEvent::Nothing;
        }

        // progress must be read before the store is wiped
        let (questions_answered, total_questions) = match SessionSnapshot::load(self.store.as_ref())
        {
            Ok(Some(snapshot)) => (snapshot.answered_count(), snapshot.total_questions),
            Ok(None) => (0, 0),
            Err(e) => {
                tracing::warn!("failed to read progress for termination report: {e}");
                (0, 0)
            }
        };
        let partial_score = crate::scoring::keywords::percent(questions_answered, total_questions);

        if let Err(e) = self.store.clear() {
            tracing::warn!("failed to clear state after termination: {e}");
        }

        tracing::warn!(
            questions_answered,
            total_questions,
            partial_score,
            "assessment terminated: {reason}"
        );

        MonitorEvent::Terminated(TerminationReport {
            reason,
            questions_answered,
            total_questions,
            partial_score,
            at: now,
        })
    }
}

/// Supplies viewport dimensions to the poll loop. `None` stops polling.
pub trait ViewportSource: Send + Sync {
    fn sample(&self) -> Option<Observation>;
}

/// Poll `source` every `interval`, forwarding every non-trivial event.
///
/// Library entry point for embedders with a window to sample; the CLI feeds
/// observations one at a time instead.
///
/// The task ends when the source is exhausted, the receiver is dropped or
/// the monitor trips.
pub fn spawn_viewport_poll(
    monitor: Arc<IntegrityMonitor>,
    source: Arc<dyn ViewportSource>,
    interval: Duration,
    events: mpsc::Sender<MonitorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let Some(observation) = source.sample() else {
                tracing::debug!("viewport source exhausted, stopping poll");
                break;
            };

            let event = monitor.observe(observation);
            if event != MonitorEvent::Nothing && events.send(event).await.is_err() {
                break;
            }
            if monitor.is_tripped() {
                break;
            }
        }
    })
}
