use anyhow::Result;

use salty::config::SaltyConfig;

/// Print the most recent executions, newest first.
pub fn history(config: &SaltyConfig, limit: usize) -> Result<()> {
    let storage = super::open_storage(config)?;
    let history = storage.load_history();

    if history.is_empty() {
        println!("No routine executions recorded.");
        return Ok(());
    }

    println!(
        "{:<19}  {:<30} {:<10} {:>9}",
        "Timestamp", "Routine", "Status", "Duration"
    );
    println!("{}", "-".repeat(72));
    for entry in history.iter().rev().take(limit) {
        println!(
            "{:<19}  {:<30} {:<10} {:>8.2}s",
            entry.timestamp, entry.routine_name, entry.status, entry.duration
        );
        if !entry.notes.is_empty() {
            println!("    {}", entry.notes);
        }
    }

    Ok(())
}
