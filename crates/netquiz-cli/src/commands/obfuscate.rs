//! The `netquiz obfuscate` command.

use anyhow::Result;

use netquiz_core::codec::obfuscate;

/// Print the encoded form of 0-based option `indices`, ready to paste into a
/// bank's `correct` field.
pub fn execute(indices: Vec<usize>) -> Result<()> {
    let encoded = obfuscate(&indices)
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("correct = [{encoded}]");
    Ok(())
}
