//! CLI `run` command: execute a routine from the terminal.

use anyhow::Result;

use salty::config::SaltyConfig;
use salty::server::setup_shared_state;

pub async fn run(config: &SaltyConfig, name: &str) -> Result<()> {
    let state = setup_shared_state(config)?;
    let report = state.executor.run(name).await?;

    println!("Routine: {} ({})", report.routine_name, report.status);
    println!("{}", "=".repeat(50));
    for step in &report.steps {
        let mark = if step.success { "ok" } else { "FAILED" };
        println!(
            "  {:>2}. [{:<6}] {:<14} {}: {}",
            step.index + 1,
            mark,
            step.step_type,
            step.action,
            step.message
        );
    }
    println!();
    println!("Duration: {:.2}s", report.duration);
    if !report.notes.is_empty() {
        println!("Notes:    {}", report.notes);
    }

    Ok(())
}
