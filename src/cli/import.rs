use anyhow::{Context, Result};
use std::path::Path;

use salty::config::SaltyConfig;

/// Import routines from a JSON array file.
///
/// Routines that already exist are skipped unless `overwrite` is set.
pub fn import(config: &SaltyConfig, file: &Path, overwrite: bool) -> Result<()> {
    let storage = super::open_storage(config)?;
    let result = storage
        .import_routines(file, overwrite)
        .with_context(|| format!("failed to import {}", file.display()))?;

    println!("Import complete:");
    println!("  Imported:  {}", result.imported);
    println!("  Skipped:   {} (already exist)", result.skipped);
    if result.failed > 0 {
        println!("  Failed:    {} (not valid routines)", result.failed);
    }
    for name in &result.imported_names {
        println!("    + {name}");
    }
    Ok(())
}
