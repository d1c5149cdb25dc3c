//! The `netquiz signal` commands: feed one environment observation to the
//! integrity monitor and report a termination if it trips.

use std::path::PathBuf;

use anyhow::Result;

use netquiz_core::integrity::{IntegrityMonitor, MonitorEvent, Observation};
use netquiz_core::traits::Notification;

use super::Workspace;

/// Parse `WIDTHxHEIGHT`, e.g. `1440x900`.
pub fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{width}': {e}"))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid height '{height}': {e}"))?;
    Ok((width, height))
}

pub async fn hidden(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    observe(config, bank, Observation::Visibility { hidden: true }).await
}

pub async fn viewport(
    config: Option<PathBuf>,
    bank: Option<PathBuf>,
    outer: (u32, u32),
    inner: (u32, u32),
) -> Result<()> {
    let observation = Observation::Viewport {
        outer_width: outer.0,
        outer_height: outer.1,
        inner_width: inner.0,
        inner_height: inner.1,
    };
    observe(config, bank, observation).await
}

async fn observe(
    config: Option<PathBuf>,
    bank: Option<PathBuf>,
    observation: Observation,
) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.resume()?;
    let started_at = controller.session().started_at;

    let mut monitor =
        IntegrityMonitor::new(ws.config.integrity.clone(), ws.store.clone(), ws.clock.clone());
    if let Some(started_at) = started_at {
        monitor = monitor.armed_since(started_at);
    }

    match monitor.observe(observation) {
        MonitorEvent::Terminated(report) => {
            controller.terminate();
            println!("Assessment terminated: {}", report.reason);
            println!(
                "Answered {} of {} question(s) ({}%).",
                report.questions_answered, report.total_questions, report.partial_score
            );

            let notification =
                Notification::termination(ws.config.candidate.clone(), &report, chrono::Utc::now());
            ws.notify(&notification, started_at).await?;
        }
        MonitorEvent::Warning(message) => println!("Warning: {message}"),
        MonitorEvent::WarningCleared => println!("Warning cleared."),
        MonitorEvent::Nothing => println!("No integrity issue recorded."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions() {
        assert_eq!(parse_dimensions("1440x900"), Ok((1440, 900)));
        assert_eq!(parse_dimensions("800X600"), Ok((800, 600)));
        assert!(parse_dimensions("1440").is_err());
        assert!(parse_dimensions("widexhigh").is_err());
    }
}
