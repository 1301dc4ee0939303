//! CLI `backup`, `restore` and `backups` commands.

use anyhow::Result;
use std::path::Path;

use salty::config::SaltyConfig;

pub fn backup(config: &SaltyConfig, name: Option<&str>) -> Result<()> {
    let storage = super::open_storage(config)?;
    let path = storage.backup(name)?;
    println!("Backup written to {}", path.display());
    Ok(())
}

/// Replace all routines and history with the contents of `file`.
pub fn restore(config: &SaltyConfig, file: &Path) -> Result<()> {
    let storage = super::open_storage(config)?;
    let result = storage.restore(file)?;
    println!(
        "Restored {} routine(s) from '{}'",
        result.routines_restored, result.backup_name
    );
    if result.history_restored {
        println!("Restored {} history entries", result.history_entries);
    } else {
        println!("Backup has no history; current history kept");
    }
    Ok(())
}

pub fn backups(config: &SaltyConfig) -> Result<()> {
    let storage = super::open_storage(config)?;
    let backups = storage.list_backups()?;

    if backups.is_empty() {
        println!("No backups in {}", storage.backups_dir().display());
        return Ok(());
    }

    for b in &backups {
        println!("  {:<40} {:>10} bytes", b.name, b.size_bytes);
    }
    Ok(())
}
