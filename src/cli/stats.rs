use anyhow::Result;

use salty::config::SaltyConfig;

/// Display routine statistics in the terminal.
pub fn stats(config: &SaltyConfig) -> Result<()> {
    let storage = super::open_storage(config)?;
    let stats = storage.stats();

    println!("Routine Statistics");
    println!("{}", "=".repeat(40));
    println!("  Custom routines:     {}", stats.total_custom_routines);
    println!("  Total executions:    {}", stats.total_executions);
    println!("  Success rate:        {:.1}%", stats.success_rate);
    match &stats.most_used_routine {
        Some(name) => println!("  Most used:           {name} ({} runs)", stats.most_used_count),
        None => println!("  Most used:           -"),
    }
    println!("  Storage size:        {} bytes", stats.total_storage_size);
    println!();

    if !stats.recent_executions.is_empty() {
        println!("Recent executions:");
        for entry in &stats.recent_executions {
            println!(
                "  {}  {:<30} {}",
                entry.timestamp, entry.routine_name, entry.status
            );
        }
    }

    Ok(())
}
