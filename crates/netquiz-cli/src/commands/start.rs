//! The `netquiz start` command.

use std::path::PathBuf;

use anyhow::Result;

use netquiz_core::session::has_saved_progress;

use super::{print_current, Workspace};

pub fn execute(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let resuming = has_saved_progress(ws.store.as_ref(), &ws.bank);

    let mut controller = ws.controller();
    controller.start();

    if let Some(warning) = controller.load_warning() {
        eprintln!("Warning: saved progress was unreadable and has been discarded ({warning})");
    }

    let answered = controller.session().answered_count();
    if resuming {
        println!(
            "Resuming {} for {}: {answered}/{} answered.",
            ws.bank.name,
            ws.config.candidate.name,
            ws.bank.len()
        );
    } else {
        println!(
            "Starting {} for {}: {} questions.",
            ws.bank.name,
            ws.config.candidate.name,
            ws.bank.len()
        );
    }
    println!();
    print_current(&controller);

    Ok(())
}
