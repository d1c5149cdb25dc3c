//! The `netquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use netquiz_notify::load_config_from;

pub fn execute(config: Option<PathBuf>, bank: Option<PathBuf>) -> Result<()> {
    let bank_path = match bank {
        Some(path) => path,
        None => load_config_from(config.as_deref())?
            .question_bank
            .ok_or_else(|| anyhow::anyhow!("no question bank given; pass --bank"))?,
    };

    let banks = if bank_path.is_dir() {
        netquiz_core::parser::load_bank_directory(&bank_path)?
    } else {
        vec![netquiz_core::parser::parse_bank(&bank_path)?]
    };

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Question bank: {} ({} questions)", bank.name, bank.len());

        let warnings = netquiz_core::parser::validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            let level = if w.fatal { "ERROR" } else { "WARNING" };
            println!("{prefix} {level}: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
