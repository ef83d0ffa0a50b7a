use chrono::NaiveDate;
use std::collections::HashSet;
use taskboard_core::{
    completion_rate, count_by_priority, KeyValueStore, ManualClock, MemoryKeyValueStore,
    PersistenceFailure, PersistenceOp, Priority, PriorityCounts, SqliteKeyValueStore,
    StorageError, StoreError, Task, TaskDraft, TaskPatch, TaskPersistence, TaskStore,
    TaskValidationError,
};

const START_MS: i64 = 1_736_467_200_000;
const KEY: &str = "todos";

type MemoryStore = TaskStore<MemoryKeyValueStore, ManualClock>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open_store() -> (MemoryStore, ManualClock) {
    let clock = ManualClock::new(START_MS);
    let persistence = TaskPersistence::new(MemoryKeyValueStore::new(), KEY);
    (TaskStore::open(persistence, clock.clone()), clock)
}

fn reopen(store: MemoryStore, clock: &ManualClock) -> MemoryStore {
    TaskStore::open(store.into_persistence(), clock.clone())
}

fn draft(name: &str, priority: Priority) -> TaskDraft {
    TaskDraft::new(name, date(2025, 1, 10), priority)
}

fn restored_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        name: format!("restored {id}"),
        due_date: date(2025, 3, 1),
        priority: Priority::Medium,
        note: String::new(),
        completed: false,
        created_at: 100,
        updated_at: 200,
    }
}

#[test]
fn add_assigns_distinct_ids_within_one_millisecond() {
    let (mut store, _clock) = open_store();

    let ids: HashSet<String> = (0..50)
        .map(|i| {
            store
                .add(draft(&format!("task {i}"), Priority::Low))
                .unwrap()
                .into_value()
                .id
        })
        .collect();

    assert_eq!(ids.len(), 50);
    assert_eq!(store.len(), 50);
}

#[test]
fn add_appends_open_task_with_equal_timestamps() {
    let (mut store, clock) = open_store();
    store.add(draft("first", Priority::Low)).unwrap();
    clock.advance(1_000);

    let before = store.len();
    let outcome = store
        .add(draft("  second  ", Priority::High).with_note("n"))
        .unwrap();
    assert!(outcome.is_persisted());
    let task = outcome.into_value();

    assert_eq!(store.len(), before + 1);
    assert_eq!(store.list().last(), Some(&task));
    assert_eq!(task.name, "second");
    assert_eq!(task.note, "n");
    assert!(!task.completed);
    assert_eq!(task.created_at, START_MS + 1_000);
    assert_eq!(task.created_at, task.updated_at);
}

#[test]
fn add_rejects_incomplete_drafts_without_writing() {
    let (mut store, _clock) = open_store();

    let blank = store.add(draft("   ", Priority::Low)).unwrap_err();
    assert_eq!(blank, StoreError::Validation(TaskValidationError::EmptyName));

    let no_due = TaskDraft {
        name: "x".to_string(),
        priority: Some(Priority::Low),
        ..TaskDraft::default()
    };
    assert_eq!(
        store.add(no_due).unwrap_err(),
        StoreError::Validation(TaskValidationError::MissingDueDate)
    );

    let no_priority = TaskDraft {
        name: "x".to_string(),
        due_date: Some(date(2025, 1, 1)),
        ..TaskDraft::default()
    };
    assert_eq!(
        store.add(no_priority).unwrap_err(),
        StoreError::Validation(TaskValidationError::MissingPriority)
    );

    assert!(store.is_empty());
    assert!(store.persistence().backend().is_empty());
}

#[test]
fn update_merges_fields_and_keeps_identity() {
    let (mut store, clock) = open_store();
    let created = store.add(draft("Write report", Priority::High)).unwrap().into_value();
    clock.advance(5_000);

    let patch: TaskPatch = serde_json::from_value(serde_json::json!({
        "id": "hijacked",
        "createdAt": 1,
        "name": "Write final report",
        "dueDate": "2025-01-20",
        "note": "v2"
    }))
    .unwrap();
    let updated = store.update(&created.id, patch).unwrap().into_value();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.name, "Write final report");
    assert_eq!(updated.due_date, date(2025, 1, 20));
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.note, "v2");
    assert!(!updated.completed);
    assert_eq!(updated.updated_at, START_MS + 5_000);
    assert_eq!(store.get(&created.id), Some(&updated));
}

#[test]
fn update_can_complete_explicitly() {
    let (mut store, _clock) = open_store();
    let created = store.add(draft("a", Priority::Low)).unwrap().into_value();

    let patch = TaskPatch {
        completed: Some(true),
        ..TaskPatch::default()
    };
    assert!(store.update(&created.id, patch).unwrap().value.completed);
}

#[test]
fn update_rejects_unknown_id_and_blank_name() {
    let (mut store, _clock) = open_store();
    let created = store.add(draft("keep", Priority::Low)).unwrap().into_value();

    let missing = store.update("nope", TaskPatch::default()).unwrap_err();
    assert_eq!(missing, StoreError::NotFound("nope".to_string()));

    let blank = TaskPatch {
        name: Some(" ".to_string()),
        priority: Some(Priority::High),
        ..TaskPatch::default()
    };
    assert!(matches!(
        store.update(&created.id, blank).unwrap_err(),
        StoreError::Validation(TaskValidationError::EmptyName)
    ));
    assert_eq!(store.get(&created.id), Some(&created));
}

#[test]
fn toggle_twice_restores_flag_and_advances_timestamp() {
    let (mut store, clock) = open_store();
    let created = store.add(draft("a", Priority::Medium)).unwrap().into_value();

    clock.advance(10);
    let first = store.toggle_complete(&created.id).unwrap().into_value();
    clock.advance(10);
    let second = store.toggle_complete(&created.id).unwrap().into_value();

    assert!(first.completed);
    assert!(!second.completed);
    assert!(first.updated_at > created.updated_at);
    assert!(second.updated_at > first.updated_at);
}

#[test]
fn updated_at_never_moves_backwards_with_the_clock() {
    let (mut store, clock) = open_store();
    let created = store.add(draft("a", Priority::Medium)).unwrap().into_value();

    let same_ms = store.toggle_complete(&created.id).unwrap().into_value();
    assert_eq!(same_ms.updated_at, created.updated_at);

    clock.set(START_MS - 60_000);
    let rewound = store.toggle_complete(&created.id).unwrap().into_value();
    assert_eq!(rewound.updated_at, created.updated_at);
    assert!(rewound.created_at <= rewound.updated_at);
}

#[test]
fn toggle_unknown_id_is_not_found() {
    let (mut store, _clock) = open_store();
    assert_eq!(
        store.toggle_complete("ghost").unwrap_err(),
        StoreError::NotFound("ghost".to_string())
    );
}

#[test]
fn remove_is_idempotent_and_skips_writes_on_noop() {
    let (mut store, _clock) = open_store();
    let a = store.add(draft("a", Priority::Low)).unwrap().into_value();
    let b = store.add(draft("b", Priority::Low)).unwrap().into_value();

    let removed = store.remove(&a.id);
    assert_eq!(removed.value.as_ref(), Some(&a));
    assert!(removed.is_persisted());
    assert!(store.list().iter().all(|task| task.id != a.id));

    store.persistence_mut().backend_mut().set_read_only(true);
    let again = store.remove(&a.id);
    assert!(again.value.is_none());
    assert!(again.warning.is_none());
    assert_eq!(store.list(), &[b]);
}

#[test]
fn clear_deletes_record_and_reopens_empty() {
    let (mut store, clock) = open_store();
    store.add(draft("a", Priority::Low)).unwrap();
    store.add(draft("b", Priority::High)).unwrap();

    let cleared = store.clear();
    assert_eq!(cleared.value, 2);
    assert!(cleared.is_persisted());
    assert!(store.is_empty());
    assert!(store.persistence().backend().get(KEY).unwrap().is_none());

    let reopened = reopen(store, &clock);
    assert!(reopened.is_empty());
    assert!(reopened.load_warning().is_none());
}

#[test]
fn replace_all_rejects_invalid_collections_untouched() {
    let (mut store, _clock) = open_store();
    let kept = store.add(draft("kept", Priority::Low)).unwrap().into_value();

    let err = store
        .replace_all(vec![restored_task("7"), restored_task("7")])
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Validation(TaskValidationError::DuplicateId("7".to_string()))
    );

    let mut reversed = restored_task("8");
    reversed.updated_at = 0;
    assert!(matches!(
        store.replace_all(vec![reversed]).unwrap_err(),
        StoreError::Validation(TaskValidationError::TimestampOrder { .. })
    ));

    assert_eq!(store.list(), &[kept]);
}

#[test]
fn replace_all_persists_verbatim_and_new_ids_avoid_restored_ones() {
    let (mut store, clock) = open_store();

    let restored = vec![restored_task(&START_MS.to_string()), restored_task("42")];
    let outcome = store.replace_all(restored.clone()).unwrap();
    assert_eq!(outcome.value, 2);
    assert_eq!(store.list(), restored.as_slice());

    let fresh = store.add(draft("fresh", Priority::High)).unwrap().into_value();
    assert!(restored.iter().all(|task| task.id != fresh.id));

    let reopened = reopen(store, &clock);
    assert_eq!(reopened.len(), 3);
    assert_eq!(&reopened.list()[..2], restored.as_slice());
}

#[test]
fn removed_restored_id_is_not_reissued() {
    let (mut store, clock) = open_store();
    let restored_id = (START_MS + 5).to_string();

    store.replace_all(vec![restored_task(&restored_id)]).unwrap();
    store.remove(&restored_id);
    clock.set(START_MS + 5);

    let fresh = store.add(draft("fresh", Priority::Low)).unwrap().into_value();
    assert_eq!(fresh.id, (START_MS + 6).to_string());
}

#[test]
fn open_starts_ids_above_loaded_ones() {
    let mut persistence = TaskPersistence::new(MemoryKeyValueStore::new(), KEY);
    let loaded_id = (START_MS + 9).to_string();
    persistence
        .save(&[restored_task(&loaded_id), restored_task("legacy-id")])
        .unwrap();

    let mut store = TaskStore::open(persistence, ManualClock::new(START_MS));
    store.remove(&loaded_id);

    let fresh = store.add(draft("fresh", Priority::Low)).unwrap().into_value();
    assert_eq!(fresh.id, (START_MS + 10).to_string());
}

#[test]
fn write_failure_keeps_in_memory_state_and_reports_warning() {
    let (mut store, clock) = open_store();
    let a = store.add(draft("a", Priority::Low)).unwrap().into_value();

    store.persistence_mut().backend_mut().set_read_only(true);
    let outcome = store.add(draft("b", Priority::High)).unwrap();
    let warning = outcome.warning.as_ref().expect("write should fail");
    assert_eq!(warning.op, PersistenceOp::Save);
    assert!(matches!(
        warning.failure,
        PersistenceFailure::Storage(StorageError::Unavailable(_))
    ));
    assert_eq!(store.len(), 2);

    let cleared = store.clear();
    assert_eq!(cleared.warning.map(|w| w.op), Some(PersistenceOp::Clear));

    let reopened = reopen(store, &clock);
    assert_eq!(reopened.list(), &[a]);
}

#[test]
fn quota_exhaustion_surfaces_as_persistence_warning() {
    let clock = ManualClock::new(START_MS);
    let persistence = TaskPersistence::new(MemoryKeyValueStore::with_quota(64), KEY);
    let mut store = TaskStore::open(persistence, clock);

    let outcome = store.add(draft("a task whose record will not fit", Priority::Low)).unwrap();
    assert!(matches!(
        outcome.warning.map(|w| w.failure),
        Some(PersistenceFailure::Storage(StorageError::QuotaExceeded { limit: 64, .. }))
    ));
    assert_eq!(store.len(), 1);
}

#[test]
fn open_falls_back_to_empty_on_malformed_record() {
    let mut backend = MemoryKeyValueStore::new();
    backend.put(KEY, b"{not json").unwrap();

    let store = TaskStore::open(TaskPersistence::new(backend, KEY), ManualClock::new(START_MS));
    assert!(store.is_empty());
    assert!(store.load_warning().is_some());
}

#[test]
fn write_report_scenario() {
    let (mut store, clock) = open_store();

    let a = store
        .add(TaskDraft::new("Write report", date(2025, 1, 10), Priority::High).with_note("draft v1"))
        .unwrap()
        .into_value();
    assert_eq!(store.list(), &[a.clone()]);
    assert!(!store.list()[0].completed);

    clock.advance(1);
    let a_done = store.toggle_complete(&a.id).unwrap().into_value();
    assert_eq!(completion_rate(std::slice::from_ref(&a_done)), 1.0);

    clock.advance(1);
    let b = store.add(draft("B", Priority::Low)).unwrap().into_value();
    assert_eq!(
        count_by_priority(store.list()),
        PriorityCounts {
            low: 1,
            medium: 0,
            high: 1
        }
    );

    store.remove(&a.id);
    assert_eq!(store.list(), &[b]);
}

#[test]
fn sqlite_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskboard.db");
    let clock = ManualClock::new(START_MS);

    let created = {
        let backend = SqliteKeyValueStore::open(&path).unwrap();
        let mut store = TaskStore::open(TaskPersistence::new(backend, KEY), clock.clone());
        let created = store.add(draft("durable", Priority::High)).unwrap();
        assert!(created.is_persisted());
        created.into_value()
    };

    let backend = SqliteKeyValueStore::open(&path).unwrap();
    let store = TaskStore::open(TaskPersistence::new(backend, KEY), clock);
    assert_eq!(store.list(), &[created]);
}
