//! Bulk import of routines from a single JSON array.
//!
//! Used for sample-routine bundles and for migrating the legacy single-file
//! `custom_routines.json` layout into one file per routine.

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use super::error::{StorageError, StorageResult};
use super::storage::{read_json, RoutineStorage};
use super::types::Routine;

/// Counts from an import run.
#[derive(Debug, Default, Serialize)]
pub struct ImportResult {
    pub imported: usize,
    /// Routines left alone because one with the same filename exists.
    pub skipped: usize,
    /// Array elements that are not valid routines.
    pub failed: usize,
    pub imported_names: Vec<String>,
}

impl RoutineStorage {
    /// Import every routine in the JSON array at `path`.
    ///
    /// Elements are read one at a time: a malformed routine is counted in
    /// `failed` and the rest still import. Existing routines are kept unless
    /// `overwrite` is set.
    pub fn import_routines(&self, path: impl AsRef<Path>, overwrite: bool) -> StorageResult<ImportResult> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StorageError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "import file not found"),
            ));
        }
        let elements: Vec<serde_json::Value> = read_json(path)?;
        info!(path = %path.display(), count = elements.len(), "importing routines");

        let mut result = ImportResult::default();
        for (index, element) in elements.into_iter().enumerate() {
            let routine: Routine = match serde_json::from_value(element) {
                Ok(routine) => routine,
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed routine");
                    result.failed += 1;
                    continue;
                }
            };
            if !overwrite && self.exists(&routine.name) {
                warn!(name = %routine.name, "routine exists, skipping");
                result.skipped += 1;
                continue;
            }
            self.add(&routine)?;
            result.imported += 1;
            result.imported_names.push(routine.name);
        }

        Ok(result)
    }
}
