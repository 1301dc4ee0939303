use std::path::PathBuf;

/// Failures surfaced by [`RoutineStorage`](super::storage::RoutineStorage).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("routine not found: {0}")]
    NotFound(String),

    #[error("a different routine already uses the name {0:?}")]
    AlreadyExists(String),

    #[error("backup file not found: {}", .0.display())]
    BackupNotFound(PathBuf),

    #[error("backup entry has no usable filename: {0:?}")]
    InvalidEntryName(String),

    #[error("backup entries {first:?} and {second:?} both restore to {target}")]
    EntryCollision {
        first: String,
        second: String,
        target: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
