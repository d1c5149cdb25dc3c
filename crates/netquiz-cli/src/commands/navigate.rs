//! The `netquiz show`, `netquiz next` and `netquiz prev` commands.

use std::path::PathBuf;

use anyhow::Result;

use netquiz_core::session::SessionState;

use super::{finish, print_current, Workspace};

pub fn show(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let controller = ws.resume()?;
    print_current(&controller);
    Ok(())
}

/// Advance past an answered question. Advancing past the last question
/// submits the assessment.
pub async fn next(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.resume()?;

    if !controller.current_has_answer() {
        anyhow::bail!("answer the current question before moving on");
    }

    controller.advance()?;
    if controller.state() == SessionState::Completed {
        println!("That was the last question. Submitting.\n");
        return finish::report(&ws, &controller).await;
    }

    print_current(&controller);
    Ok(())
}

pub fn prev(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.resume()?;
    controller.retreat()?;
    print_current(&controller);
    Ok(())
}
