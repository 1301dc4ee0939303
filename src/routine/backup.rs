//! Whole-store backup and restore.
//!
//! A backup is a single JSON document holding every routine file (keyed by its
//! filename) plus the execution history. Restoring replaces all routines.

use chrono::Local;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

use super::error::{StorageError, StorageResult};
use super::storage::{json_files_in, read_json, sanitize_filename, write_json, RoutineStorage};
use super::types::{BackupData, Routine};

/// A backup file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct BackupSummary {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Summary of a completed restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreResult {
    pub backup_name: String,
    pub routines_restored: usize,
    /// Whether the backup carried a history; without one the current history is kept.
    pub history_restored: bool,
    pub history_entries: usize,
}

impl RoutineStorage {
    /// Snapshot every routine and the history into `backups/<name>.json`.
    ///
    /// Without a name, `backup_YYYYMMDD_HHMMSS` is used.
    pub fn backup(&self, backup_name: Option<&str>) -> StorageResult<PathBuf> {
        let backup_name = match backup_name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("backup_{}", Local::now().format("%Y%m%d_%H%M%S")),
        };

        let backups_dir = self.backups_dir();
        std::fs::create_dir_all(&backups_dir).map_err(|e| StorageError::io(&backups_dir, e))?;

        let mut custom_routines = BTreeMap::new();
        for path in self.routine_files()? {
            let routine: Routine = read_json(&path)?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            custom_routines.insert(filename, routine);
        }

        let data = BackupData {
            custom_routines,
            routine_history: Some(self.load_history()),
            backup_timestamp: Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            backup_name: backup_name.clone(),
        };

        let backup_file = backups_dir.join(format!("{}.json", sanitize_filename(&backup_name)));
        write_json(&backup_file, &data)?;

        info!(
            path = %backup_file.display(),
            routines = data.custom_routines.len(),
            history = data.routine_history.as_ref().map_or(0, Vec::len),
            "created routine backup"
        );
        Ok(backup_file)
    }

    /// Replace all routines and history with the contents of `backup_file`.
    ///
    /// Entry filenames are re-sanitized before writing. An entry whose key
    /// contains a path separator, or two entries that sanitize to the same
    /// file, abort the restore before anything is removed. History is only
    /// replaced when the backup contains one.
    pub fn restore(&self, backup_file: impl AsRef<Path>) -> StorageResult<RestoreResult> {
        let backup_path = backup_file.as_ref();
        if !backup_path.exists() {
            return Err(StorageError::BackupNotFound(backup_path.to_path_buf()));
        }

        let data: BackupData = read_json(backup_path)?;

        let mut targets = Vec::with_capacity(data.custom_routines.len());
        let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
        for (filename, routine) in &data.custom_routines {
            if filename.contains('/') || filename.contains('\\') {
                return Err(StorageError::InvalidEntryName(filename.clone()));
            }
            let stem = filename.strip_suffix(".json").unwrap_or(filename);
            let target = self
                .routines_dir()
                .join(format!("{}.json", sanitize_filename(stem)));
            if target.file_name().map(|n| n.to_string_lossy().into_owned()).as_deref()
                != Some(filename.as_str())
            {
                warn!(entry = %filename, target = %target.display(), "backup entry renamed on restore");
            }
            if let Some(first) = claimed.insert(target.clone(), filename.as_str()) {
                return Err(StorageError::EntryCollision {
                    first: first.to_string(),
                    second: filename.clone(),
                    target: target
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                });
            }
            targets.push((target, routine));
        }

        self.clear_routine_files()?;
        for (target, routine) in &targets {
            write_json(target, routine)?;
        }
        let history_entries = match &data.routine_history {
            Some(history) => {
                self.save_history(history)?;
                history.len().min(self.history_limit())
            }
            None => {
                info!("backup has no history, keeping current history");
                0
            }
        };

        info!(path = %backup_path.display(), "restored routines from backup");
        Ok(RestoreResult {
            backup_name: data.backup_name,
            routines_restored: targets.len(),
            history_restored: data.routine_history.is_some(),
            history_entries,
        })
    }

    /// Backups in `backups/`, most recently modified first.
    pub fn list_backups(&self) -> StorageResult<Vec<BackupSummary>> {
        let mut backups: Vec<(SystemTime, BackupSummary)> = json_files_in(&self.backups_dir())?
            .into_iter()
            .map(|path| {
                let meta = std::fs::metadata(&path).ok();
                let modified = meta
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                let summary = BackupSummary {
                    name: path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    size_bytes: meta.map(|m| m.len()).unwrap_or(0),
                    path,
                };
                (modified, summary)
            })
            .collect();

        backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.name.cmp(&a.1.name)));
        Ok(backups.into_iter().map(|(_, s)| s).collect())
    }
}
