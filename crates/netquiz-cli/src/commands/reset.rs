//! The `netquiz reset` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{print_current, Workspace};

pub fn execute(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let ws = Workspace::open(config, bank)?;
    let mut controller = ws.controller();
    controller.reset();

    println!("Progress cleared. Starting {} again.\n", ws.bank.name);
    print_current(&controller);
    Ok(())
}
