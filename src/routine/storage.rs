//! Per-routine JSON file persistence and execution history.
//!
//! Layout under the routines root:
//!
//! ```text
//! <root>/
//!   custom_routines/<sanitized name>.json
//!   routine_history.json
//!   backups/<backup name>.json
//! ```
//!
//! Reads degrade to empty collections when a file is missing or corrupt; writes
//! go through a temp file and a rename so a crash never leaves half a file behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::error::{StorageError, StorageResult};
use super::types::{HistoryEntry, Routine, UNNAMED_ROUTINE};

/// Number of history entries kept on disk.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

const CUSTOM_ROUTINES_DIR: &str = "custom_routines";
const HISTORY_FILE: &str = "routine_history.json";
const BACKUPS_DIR: &str = "backups";

/// Convert a routine name into a safe file stem.
///
/// Keeps word characters, whitespace and `-`, collapses runs of whitespace and
/// `-` into a single `_`, then lowercases. The result never contains `.` or a
/// path separator.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_whitespace() || c == '-' {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else if c.is_alphanumeric() || c == '_' {
            out.extend(c.to_lowercase());
            in_run = false;
        }
        // anything else is dropped without ending a whitespace run
    }

    if out.is_empty() {
        UNNAMED_ROUTINE.to_string()
    } else {
        out
    }
}

/// File-backed store for routines and their execution history.
#[derive(Debug, Clone)]
pub struct RoutineStorage {
    root: PathBuf,
    routines_dir: PathBuf,
    history_file: PathBuf,
    history_limit: usize,
}

impl RoutineStorage {
    /// Open (or create) a routine store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        let routines_dir = root.join(CUSTOM_ROUTINES_DIR);
        std::fs::create_dir_all(&routines_dir)
            .map_err(|e| StorageError::io(&routines_dir, e))?;

        info!(root = %root.display(), "routine storage initialized");
        Ok(Self {
            history_file: root.join(HISTORY_FILE),
            routines_dir,
            root,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// Override how many history entries are retained.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn routines_dir(&self) -> &Path {
        &self.routines_dir
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Full path of the file that stores the routine called `name`.
    pub fn routine_path(&self, name: &str) -> PathBuf {
        self.routines_dir
            .join(format!("{}.json", sanitize_filename(name)))
    }

    /// All `*.json` files in the routines directory, sorted by filename.
    pub(crate) fn routine_files(&self) -> StorageResult<Vec<PathBuf>> {
        json_files_in(&self.routines_dir)
    }

    /// Replace every stored routine with `routines`.
    pub fn save_all(&self, routines: &[Routine]) -> StorageResult<()> {
        self.clear_routine_files()?;
        for routine in routines {
            write_json(&self.routine_path(&routine.name), routine)?;
        }
        info!(count = routines.len(), "saved custom routines");
        Ok(())
    }

    /// Load every routine, oldest `created` first. Files that fail to parse are
    /// skipped.
    pub fn load_all(&self) -> Vec<Routine> {
        let files = match self.routine_files() {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "failed to list routine files");
                return Vec::new();
            }
        };

        let mut routines: Vec<Routine> = files
            .iter()
            .filter_map(|path| match read_json::<Routine>(path) {
                Ok(routine) => Some(routine),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable routine file");
                    None
                }
            })
            .collect();

        routines.sort_by(|a, b| a.created.cmp(&b.created));
        info!(count = routines.len(), "loaded custom routines");
        routines
    }

    /// Store a single routine, overwriting any routine with the same filename.
    pub fn add(&self, routine: &Routine) -> StorageResult<PathBuf> {
        let path = self.routine_path(&routine.name);
        if path.exists() {
            warn!(name = %routine.name, "routine already exists, overwriting");
        }
        write_json(&path, routine)?;
        info!(name = %routine.name, "added custom routine");
        Ok(path)
    }

    /// Overwrite the routine stored under `name`. If the new routine carries a
    /// different name, the file moves with it; moving onto another routine's
    /// file is refused with [`StorageError::AlreadyExists`].
    pub fn update(&self, name: &str, routine: &Routine) -> StorageResult<PathBuf> {
        let old_path = self.routine_path(name);
        if !old_path.exists() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let new_path = self.routine_path(&routine.name);
        if new_path != old_path && new_path.exists() {
            return Err(StorageError::AlreadyExists(routine.name.clone()));
        }
        write_json(&new_path, routine)?;
        if new_path != old_path {
            std::fs::remove_file(&old_path).map_err(|e| StorageError::io(&old_path, e))?;
            info!(from = %name, to = %routine.name, "renamed custom routine");
        }
        info!(name = %routine.name, "updated custom routine");
        Ok(new_path)
    }

    /// Stamp `last_run` on the routine stored under `name`, in place. The file
    /// is re-read first so edits made while the routine ran are kept.
    pub fn mark_run(&self, name: &str, timestamp: &str) -> StorageResult<()> {
        let path = self.routine_path(name);
        if !path.exists() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        let mut routine: Routine = read_json(&path)?;
        routine.last_run = Some(timestamp.to_string());
        write_json(&path, &routine)
    }

    /// Delete the routine stored under `name`.
    pub fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.routine_path(name);
        if !path.exists() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        std::fs::remove_file(&path).map_err(|e| StorageError::io(&path, e))?;
        info!(name = %name, "deleted routine");
        Ok(())
    }

    /// Fetch one routine by name. Unreadable files are logged and treated as absent.
    pub fn get(&self, name: &str) -> Option<Routine> {
        let path = self.routine_path(name);
        if !path.exists() {
            return None;
        }
        match read_json(&path) {
            Ok(routine) => Some(routine),
            Err(e) => {
                error!(error = %e, name = %name, "failed to read routine");
                None
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.routine_path(name).exists()
    }

    /// Filenames (not paths) of every stored routine.
    pub fn list_files(&self) -> Vec<String> {
        self.routine_files()
            .unwrap_or_default()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    /// Load execution history. A missing or corrupt file yields an empty list;
    /// individual entries that cannot be read are skipped.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        let raw = match self.read_history_values() {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "failed to load routine history");
                return Vec::new();
            }
        };
        raw.into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(index, error = %e, "skipping unreadable history entry");
                    None
                }
            })
            .collect()
    }

    fn read_history_values(&self) -> StorageResult<Vec<serde_json::Value>> {
        if !self.history_file.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.history_file)
    }

    /// Persist history, keeping only the most recent entries.
    pub fn save_history(&self, history: &[HistoryEntry]) -> StorageResult<()> {
        let start = history.len().saturating_sub(self.history_limit);
        let kept = &history[start..];
        write_json(&self.history_file, &kept)?;
        info!(count = kept.len(), "saved routine history");
        Ok(())
    }

    /// Append one execution to history.
    ///
    /// Existing entries are carried over as raw JSON, so entries this crate
    /// cannot interpret are kept. A history file that exists but does not
    /// parse is left untouched and an error is returned.
    pub fn record_execution(&self, entry: HistoryEntry) -> StorageResult<()> {
        let mut raw = self.read_history_values()?;
        raw.push(
            serde_json::to_value(&entry).map_err(|e| StorageError::json(&self.history_file, e))?,
        );
        let start = raw.len().saturating_sub(self.history_limit);
        write_json(&self.history_file, &raw[start..])?;
        info!(routine = %entry.routine_name, status = %entry.status, "recorded routine execution");
        Ok(())
    }

    pub(crate) fn clear_routine_files(&self) -> StorageResult<()> {
        for path in self.routine_files()? {
            std::fs::remove_file(&path).map_err(|e| StorageError::io(&path, e))?;
        }
        Ok(())
    }
}

/// `*.json` files directly inside `dir`, sorted by filename.
pub(crate) fn json_files_in(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StorageError::io(dir, e))?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if path.is_file() && is_json && !hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| StorageError::json(path, e))
}

/// Pretty-print `value` to `path` via a temp file and rename.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, json).map_err(|e| StorageError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))
}
