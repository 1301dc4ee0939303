pub mod backup;
pub mod history;
pub mod import;
pub mod routines;
pub mod run;
pub mod stats;

use anyhow::{Context, Result};

use salty::config::SaltyConfig;
use salty::routine::RoutineStorage;

/// Open the routine store configured in `config`.
fn open_storage(config: &SaltyConfig) -> Result<RoutineStorage> {
    let dir = config.resolved_routines_dir();
    let storage = RoutineStorage::open(&dir)
        .with_context(|| format!("failed to open routine storage at {}", dir.display()))?
        .with_history_limit(config.storage.history_limit);
    Ok(storage)
}
