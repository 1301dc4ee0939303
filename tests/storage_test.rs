mod helpers;

use helpers::{light_routine, temp_storage};
use salty::routine::types::{ExecutionStatus, HistoryEntry, Routine, RoutineStep, StepType};
use salty::routine::{RoutineStorage, StorageError};

fn history_entry(name: &str, i: usize, status: ExecutionStatus) -> HistoryEntry {
    HistoryEntry {
        routine_name: name.to_string(),
        timestamp: format!("2024-01-01 00:00:{:02}", i % 60),
        status,
        duration: 0.5,
        notes: String::new(),
    }
}

#[test]
fn add_then_get_round_trips() {
    let (_dir, storage) = temp_storage();
    let routine = light_routine("Movie Night");

    let path = storage.add(&routine).unwrap();
    assert!(path.ends_with("custom_routines/movie_night.json"));

    let loaded = storage.get("Movie Night").unwrap();
    assert_eq!(loaded, routine);
    assert!(storage.exists("movie night"), "lookup goes through the sanitized filename");
}

#[test]
fn same_sanitized_name_overwrites() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Good Morning")).unwrap();

    let mut replacement = light_routine("good-morning");
    replacement.description = "second".into();
    storage.add(&replacement).unwrap();

    let all = storage.load_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].description, "second");
}

#[test]
fn load_all_skips_corrupt_files() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Valid")).unwrap();
    std::fs::write(storage.routines_dir().join("broken.json"), "{ not json").unwrap();

    let all = storage.load_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Valid");
}

#[test]
fn load_all_orders_by_created() {
    let (_dir, storage) = temp_storage();
    let mut late = light_routine("Alpha");
    late.created = "2024-06-01 08:00:00".into();
    let mut early = light_routine("Zulu");
    early.created = "2024-01-01 08:00:00".into();
    storage.add(&late).unwrap();
    storage.add(&early).unwrap();

    let names: Vec<_> = storage.load_all().into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["Zulu", "Alpha"]);
}

#[test]
fn save_all_replaces_every_routine() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Old")).unwrap();

    storage
        .save_all(&[light_routine("New One"), light_routine("New Two")])
        .unwrap();

    assert!(!storage.exists("Old"));
    assert_eq!(storage.list_files(), ["new_one.json", "new_two.json"]);
}

#[test]
fn update_missing_routine_is_not_found() {
    let (_dir, storage) = temp_storage();
    let err = storage.update("Ghost", &light_routine("Ghost")).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(ref n) if n == "Ghost"));
}

#[test]
fn update_with_new_name_moves_the_file() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Bedtime")).unwrap();

    let mut renamed = storage.get("Bedtime").unwrap();
    renamed.name = "Lights Out".into();
    storage.update("Bedtime", &renamed).unwrap();

    assert!(!storage.exists("Bedtime"));
    assert_eq!(storage.get("Lights Out").unwrap().name, "Lights Out");
    assert_eq!(storage.list_files(), ["lights_out.json"]);
}

#[test]
fn delete_removes_file_and_reports_missing() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Party")).unwrap();

    storage.delete("Party").unwrap();
    assert!(storage.get("Party").is_none());
    assert!(matches!(
        storage.delete("Party").unwrap_err(),
        StorageError::NotFound(_)
    ));
}

#[test]
fn routine_names_cannot_escape_the_store() {
    let (dir, storage) = temp_storage();
    let routine = Routine::new(
        "../../etc/passwd",
        "",
        vec![RoutineStep::new(StepType::Wait, 1u64)],
    );
    let path = storage.add(&routine).unwrap();

    assert_eq!(path.parent().unwrap(), storage.routines_dir());
    assert!(path.starts_with(dir.path()));
    assert_eq!(path.file_name().unwrap(), "etcpasswd.json");
}

#[test]
fn history_is_capped_at_most_recent_entries() {
    let (_dir, storage) = temp_storage();
    let history: Vec<_> = (0..120)
        .map(|i| history_entry(&format!("r{i}"), i, ExecutionStatus::Completed))
        .collect();

    storage.save_history(&history).unwrap();

    let loaded = storage.load_history();
    assert_eq!(loaded.len(), 100);
    assert_eq!(loaded[0].routine_name, "r20");
    assert_eq!(loaded[99].routine_name, "r119");
}

#[test]
fn record_execution_appends_and_respects_custom_limit() {
    let dir = tempfile::TempDir::new().unwrap();
    let storage = RoutineStorage::open(dir.path()).unwrap().with_history_limit(3);

    for i in 0..5 {
        storage
            .record_execution(history_entry("Loop", i, ExecutionStatus::Completed))
            .unwrap();
    }

    let loaded = storage.load_history();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].timestamp, "2024-01-01 00:00:02");
}

#[test]
fn corrupt_history_loads_as_empty() {
    let (dir, storage) = temp_storage();
    std::fs::write(dir.path().join("routine_history.json"), "[{").unwrap();
    assert!(storage.load_history().is_empty());
}

#[test]
fn stats_summarise_history() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Morning")).unwrap();
    storage.add(&light_routine("Evening")).unwrap();
    for (i, (name, status)) in [
        ("Morning", ExecutionStatus::Completed),
        ("Morning", ExecutionStatus::Completed),
        ("Evening", ExecutionStatus::Failed),
    ]
    .into_iter()
    .enumerate()
    {
        storage.record_execution(history_entry(name, i, status)).unwrap();
    }

    let stats = storage.stats();
    assert_eq!(stats.total_custom_routines, 2);
    assert_eq!(stats.total_executions, 3);
    assert_eq!(stats.success_rate, 66.7);
    assert_eq!(stats.most_used_routine.as_deref(), Some("Morning"));
    assert_eq!(stats.most_used_count, 2);
    assert_eq!(stats.recent_executions.len(), 3);
    assert!(stats.total_storage_size > 0);
    assert_eq!(stats.routine_files.len(), 2);
}

#[test]
fn stats_on_empty_store() {
    let (_dir, storage) = temp_storage();
    let stats = storage.stats();
    assert_eq!(stats.total_executions, 0);
    assert_eq!(stats.success_rate, 0.0);
    assert!(stats.most_used_routine.is_none());
}

#[test]
fn appending_keeps_entries_written_by_other_tools() {
    let (dir, storage) = temp_storage();
    let mut raw: Vec<serde_json::Value> = (0..5)
        .map(|i| serde_json::to_value(history_entry("Morning", i, ExecutionStatus::Completed)).unwrap())
        .collect();
    raw.push(serde_json::json!({
        "routine_name": "Party",
        "timestamp": "2023-12-31 23:00:00",
        "status": "completed",
        "duration": "2m 30s"
    }));
    raw.push(serde_json::json!({ "routine_name": "No Timestamp", "status": "failed" }));
    raw.push(serde_json::json!("not an entry"));
    let history_file = dir.path().join("routine_history.json");
    std::fs::write(&history_file, serde_json::to_string(&raw).unwrap()).unwrap();

    let loaded = storage.load_history();
    assert_eq!(loaded.len(), 7, "only the non-object entry is skipped");
    assert_eq!(loaded[5].duration, 150.0);
    assert_eq!(loaded[6].timestamp, "");

    storage
        .record_execution(history_entry("Evening", 9, ExecutionStatus::Partial))
        .unwrap();

    let on_disk: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&history_file).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 9);
    assert_eq!(on_disk[5]["duration"], "2m 30s", "foreign entries are written back unchanged");
    assert_eq!(on_disk[7], "not an entry");
    assert_eq!(on_disk[8]["routine_name"], "Evening");
}

#[test]
fn record_execution_leaves_unparseable_history_alone() {
    let (dir, storage) = temp_storage();
    let history_file = dir.path().join("routine_history.json");
    std::fs::write(&history_file, "[{").unwrap();

    let err = storage
        .record_execution(history_entry("Morning", 0, ExecutionStatus::Completed))
        .unwrap_err();
    assert!(matches!(err, StorageError::Json { .. }));
    assert_eq!(std::fs::read_to_string(&history_file).unwrap(), "[{");
}

#[test]
fn update_refuses_to_rename_onto_another_routine() {
    let (_dir, storage) = temp_storage();
    let mut morning = light_routine("Morning");
    morning.description = "keep".into();
    storage.add(&morning).unwrap();
    storage.add(&light_routine("Evening")).unwrap();

    let mut renamed = storage.get("Evening").unwrap();
    renamed.name = "morning".into();
    let err = storage.update("Evening", &renamed).unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists(_)));
    assert_eq!(storage.get("Morning").unwrap().description, "keep");
    assert!(storage.exists("Evening"));
}

#[test]
fn mark_run_stamps_the_file_in_place() {
    let (_dir, storage) = temp_storage();
    let mut stray = light_routine("Evening");
    stray.description = "legacy copy".into();
    let stray_path = storage.routines_dir().join("old_evening.json");
    std::fs::write(&stray_path, serde_json::to_string(&stray).unwrap()).unwrap();

    storage.mark_run("old_evening", "2024-07-04 20:00:00").unwrap();

    let reloaded = storage.get("old_evening").unwrap();
    assert_eq!(reloaded.last_run.as_deref(), Some("2024-07-04 20:00:00"));
    assert_eq!(reloaded.name, "Evening");
    assert_eq!(storage.list_files(), ["old_evening.json"]);
    assert!(matches!(
        storage.mark_run("missing", "2024-07-04 20:00:00").unwrap_err(),
        StorageError::NotFound(_)
    ));
}
