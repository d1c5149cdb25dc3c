//! The `netquiz finish` command.

use std::path::PathBuf;

use anyhow::Result;

use netquiz_core::session::SessionController;
use netquiz_core::traits::Notification;

use super::{result::print_summary, Workspace};

pub async fn execute(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.resume()?;
    controller.finish()?;
    report(&ws, &controller).await
}

/// Print the summary of a completed session and send the completion report.
pub async fn report(ws: &Workspace, controller: &SessionController) -> Result<()> {
    let result = controller.compute_result();
    print_summary(&ws.bank.name, &result);

    let notification =
        Notification::completion(ws.config.candidate.clone(), &result, chrono::Utc::now());
    ws.notify(&notification, controller.session().started_at).await
}
