pub mod action;
pub mod backup;
pub mod error;
pub mod executor;
pub mod import;
pub mod stats;
pub mod storage;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use storage::{sanitize_filename, RoutineStorage};
