mod helpers;

use helpers::{light_routine, temp_storage};
use salty::routine::types::{ExecutionStatus, HistoryEntry};
use salty::routine::StorageError;

fn completed(name: &str) -> HistoryEntry {
    HistoryEntry {
        routine_name: name.to_string(),
        timestamp: "2024-03-01 07:00:00".into(),
        status: ExecutionStatus::Completed,
        duration: 1.25,
        notes: String::new(),
    }
}

#[test]
fn backup_then_restore_recovers_routines_and_history() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Morning")).unwrap();
    storage.add(&light_routine("Evening")).unwrap();
    storage.record_execution(completed("Morning")).unwrap();

    let backup = storage.backup(Some("Before Party")).unwrap();
    assert!(backup.ends_with("backups/before_party.json"));

    storage.delete("Morning").unwrap();
    storage.add(&light_routine("Scratch")).unwrap();
    storage.save_history(&[]).unwrap();

    let result = storage.restore(&backup).unwrap();
    assert_eq!(result.backup_name, "Before Party");
    assert_eq!(result.routines_restored, 2);
    assert!(result.history_restored);
    assert_eq!(result.history_entries, 1);

    assert_eq!(storage.list_files(), ["evening.json", "morning.json"]);
    assert!(!storage.exists("Scratch"), "restore replaces all routines");
    assert_eq!(storage.load_history(), vec![completed("Morning")]);
}

#[test]
fn backup_without_name_uses_timestamp() {
    let (_dir, storage) = temp_storage();
    let backup = storage.backup(None).unwrap();
    let stem = backup.file_stem().unwrap().to_string_lossy().into_owned();
    assert!(stem.starts_with("backup_"), "got {stem}");
    assert_eq!(stem.len(), "backup_20240101_120000".len());
}

#[test]
fn backup_document_layout() {
    let (_dir, storage) = temp_storage();
    storage.add(&light_routine("Morning")).unwrap();
    let backup = storage.backup(Some("snap")).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(backup).unwrap()).unwrap();
    assert_eq!(doc["backup_name"], "snap");
    assert!(doc["backup_timestamp"].as_str().unwrap().contains('T'));
    assert_eq!(doc["custom_routines"]["morning.json"]["name"], "Morning");
    assert!(doc["routine_history"].as_array().unwrap().is_empty());
}

#[test]
fn restore_missing_backup_fails() {
    let (dir, storage) = temp_storage();
    let err = storage
        .restore(dir.path().join("backups/nope.json"))
        .unwrap_err();
    assert!(matches!(err, StorageError::BackupNotFound(_)));
}

#[test]
fn restore_rejects_path_traversal_before_touching_routines() {
    let (dir, storage) = temp_storage();
    storage.add(&light_routine("Keep Me")).unwrap();

    let evil = serde_json::json!({
        "custom_routines": {
            "../../outside.json": { "name": "Evil", "steps": [] }
        },
        "routine_history": [],
        "backup_timestamp": "2024-01-01T00:00:00.000000",
        "backup_name": "evil"
    });
    let path = dir.path().join("evil.json");
    std::fs::write(&path, evil.to_string()).unwrap();

    let err = storage.restore(&path).unwrap_err();
    assert!(matches!(err, StorageError::InvalidEntryName(_)));
    assert!(storage.exists("Keep Me"));
    assert!(!dir.path().join("outside.json").exists());
}

#[test]
fn restore_resanitizes_entry_names() {
    let (dir, storage) = temp_storage();
    let doc = serde_json::json!({
        "custom_routines": {
            "Wake Up!.json": { "name": "Wake Up", "steps": [] }
        },
        "backup_timestamp": "2024-01-01T00:00:00.000000",
        "backup_name": "hand edited"
    });
    let path = dir.path().join("hand.json");
    std::fs::write(&path, doc.to_string()).unwrap();

    storage.record_execution(completed("Morning")).unwrap();
    storage.restore(&path).unwrap();
    assert_eq!(storage.list_files(), ["wake_up.json"]);
    assert_eq!(storage.load_history().len(), 1, "no history key, history untouched");
}

#[test]
fn list_backups_reports_every_file() {
    let (_dir, storage) = temp_storage();
    assert!(storage.list_backups().unwrap().is_empty());

    storage.backup(Some("first")).unwrap();
    storage.backup(Some("second")).unwrap();

    let backups = storage.list_backups().unwrap();
    let mut names: Vec<_> = backups.iter().map(|b| b.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["first", "second"]);
    assert!(backups.iter().all(|b| b.size_bytes > 0));
}

#[test]
fn import_skips_existing_unless_overwrite() {
    let (dir, storage) = temp_storage();
    let mut existing = light_routine("Morning");
    existing.description = "original".into();
    storage.add(&existing).unwrap();

    let bundle = serde_json::json!([
        { "name": "Morning", "description": "imported", "steps": [] },
        { "name": "Movie Night", "description": "imported", "steps": [
            { "type": "Light Control", "action": "Dim" },
            { "type": "Wait", "action": 2 }
        ]}
    ]);
    let path = dir.path().join("bundle.json");
    std::fs::write(&path, bundle.to_string()).unwrap();

    let result = storage.import_routines(&path, false).unwrap();
    assert_eq!(result.imported, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.imported_names, ["Movie Night"]);
    assert_eq!(storage.get("Morning").unwrap().description, "original");
    assert_eq!(storage.get("Movie Night").unwrap().steps.len(), 2);

    let result = storage.import_routines(&path, true).unwrap();
    assert_eq!(result.imported, 2);
    assert_eq!(storage.get("Morning").unwrap().description, "imported");
}

#[test]
fn import_missing_file_errors() {
    let (dir, storage) = temp_storage();
    assert!(storage
        .import_routines(dir.path().join("missing.json"), false)
        .is_err());
}

#[test]
fn restore_without_history_keeps_current_history() {
    let (dir, storage) = temp_storage();
    storage.record_execution(completed("Morning")).unwrap();

    let doc = serde_json::json!({
        "custom_routines": {},
        "backup_timestamp": "2024-01-01T00:00:00.000000",
        "backup_name": "routines only"
    });
    let path = dir.path().join("routines_only.json");
    std::fs::write(&path, doc.to_string()).unwrap();

    let result = storage.restore(&path).unwrap();
    assert!(!result.history_restored);
    assert_eq!(result.history_entries, 0);
    assert_eq!(storage.load_history(), vec![completed("Morning")]);
}

#[test]
fn restore_rejects_entries_that_collide_after_sanitizing() {
    let (dir, storage) = temp_storage();
    storage.add(&light_routine("Keep Me")).unwrap();

    let doc = serde_json::json!({
        "custom_routines": {
            "A.json": { "name": "A", "steps": [] },
            "a.json": { "name": "a", "steps": [] }
        },
        "routine_history": [],
        "backup_timestamp": "2024-01-01T00:00:00.000000",
        "backup_name": "clash"
    });
    let path = dir.path().join("clash.json");
    std::fs::write(&path, doc.to_string()).unwrap();

    let err = storage.restore(&path).unwrap_err();
    assert!(matches!(err, StorageError::EntryCollision { ref target, .. } if target == "a.json"));
    assert_eq!(storage.list_files(), ["keep_me.json"]);
}

#[test]
fn import_counts_malformed_routines_and_keeps_going() {
    let (dir, storage) = temp_storage();
    let bundle = serde_json::json!([
        { "name": "Legacy", "steps": [ { "type": "Climate Control", "action": "Cool" } ] },
        "not a routine",
        { "name": "Sunrise", "steps": [ { "type": "Light Control", "action": "Turn On" } ] }
    ]);
    let path = dir.path().join("legacy.json");
    std::fs::write(&path, bundle.to_string()).unwrap();

    let result = storage.import_routines(&path, false).unwrap();
    assert_eq!(result.imported, 1);
    assert_eq!(result.failed, 2);
    assert_eq!(result.imported_names, ["Sunrise"]);
    assert!(storage.exists("Sunrise"));
}
