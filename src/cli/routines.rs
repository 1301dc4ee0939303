//! CLI `list`, `show` and `delete` commands.

use anyhow::{bail, Result};

use salty::config::SaltyConfig;

/// Print every stored routine, oldest first.
pub fn list(config: &SaltyConfig) -> Result<()> {
    let storage = super::open_storage(config)?;
    let routines = storage.load_all();

    if routines.is_empty() {
        println!("No routines saved in {}", storage.routines_dir().display());
        return Ok(());
    }

    println!("{:<30} {:>5}  {:<19}  Last run", "Name", "Steps", "Created");
    println!("{}", "-".repeat(80));
    for r in &routines {
        println!(
            "{:<30} {:>5}  {:<19}  {}",
            r.name,
            r.steps.len(),
            r.created,
            r.last_run.as_deref().unwrap_or("never")
        );
    }
    println!();
    println!("{} routine(s)", routines.len());

    Ok(())
}

/// Show one routine in full.
pub fn show(config: &SaltyConfig, name: &str) -> Result<()> {
    let storage = super::open_storage(config)?;
    let Some(routine) = storage.get(name) else {
        bail!("routine not found: {name}");
    };

    println!("Routine: {}", routine.name);
    println!("{}", "=".repeat(50));
    if !routine.description.is_empty() {
        println!("  Description:  {}", routine.description);
    }
    println!("  Created:      {}", routine.created);
    println!(
        "  Last run:     {}",
        routine.last_run.as_deref().unwrap_or("never")
    );
    println!("  File:         {}", storage.routine_path(name).display());
    println!();
    println!("Steps:");
    for (i, step) in routine.steps.iter().enumerate() {
        println!("  {:>2}. {:<14} {}", i + 1, step.step_type, step.action.as_text());
    }

    Ok(())
}

/// Delete one routine.
pub fn delete(config: &SaltyConfig, name: &str) -> Result<()> {
    let storage = super::open_storage(config)?;
    storage.delete(name)?;
    println!("Deleted routine '{name}'");
    Ok(())
}
