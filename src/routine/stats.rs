use serde::Serialize;

use super::storage::RoutineStorage;
use super::types::{ExecutionStatus, HistoryEntry};

/// Number of executions reported in [`RoutineStats::recent_executions`].
const RECENT_EXECUTIONS: usize = 10;

/// Aggregate view over stored routines and their history.
#[derive(Debug, Serialize)]
pub struct RoutineStats {
    pub total_custom_routines: usize,
    pub total_executions: usize,
    /// Percentage of `completed` executions, rounded to one decimal.
    pub success_rate: f64,
    pub most_used_routine: Option<String>,
    pub most_used_count: usize,
    pub recent_executions: Vec<HistoryEntry>,
    pub total_storage_size: u64,
    pub routine_files: Vec<String>,
}

impl RoutineStorage {
    /// Compute routine store statistics.
    pub fn stats(&self) -> RoutineStats {
        let routines = self.load_all();
        let history = self.load_history();

        let (most_used_routine, most_used_count) = most_used(&history);

        let total_storage_size = self
            .routine_files()
            .unwrap_or_default()
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        let recent_start = history.len().saturating_sub(RECENT_EXECUTIONS);

        RoutineStats {
            total_custom_routines: routines.len(),
            total_executions: history.len(),
            success_rate: success_rate(&history),
            most_used_routine,
            most_used_count,
            recent_executions: history[recent_start..].to_vec(),
            total_storage_size,
            routine_files: self.list_files(),
        }
    }
}

fn success_rate(history: &[HistoryEntry]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let completed = history
        .iter()
        .filter(|e| e.status == ExecutionStatus::Completed)
        .count();
    let rate = completed as f64 / history.len() as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Most frequently executed routine; ties go to the name seen first.
fn most_used(history: &[HistoryEntry]) -> (Option<String>, usize) {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for entry in history {
        match counts.iter_mut().find(|(name, _)| *name == entry.routine_name) {
            Some((_, count)) => *count += 1,
            None => counts.push((entry.routine_name.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    match best {
        Some((name, count)) => (Some(name.to_string()), count),
        None => (None, 0),
    }
}
