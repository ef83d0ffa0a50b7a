//! Core task-tracking logic for taskboard.
//! This crate is the single source of truth for task invariants; views read
//! snapshots from `TaskStore` and derive numbers through `stats`.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    validate_collection, Priority, Task, TaskDraft, TaskId, TaskPatch, TaskValidationError,
    Timestamp,
};
pub use repo::kv::{KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult};
pub use repo::sqlite_kv::SqliteKeyValueStore;
pub use repo::task_persistence::{
    DeserializationFailure, DeserializationWarning, LoadOutcome, PersistenceFailure,
    PersistenceOp, PersistenceWarning, TaskPersistence,
};
pub use service::task_store::{StoreError, StoreOutcome, StoreResult, TaskStore};
pub use stats::dashboard::DashboardSummary;
pub use stats::engine::{
    completed, completion_percent, completion_rate, completions_by_day, completions_by_day_in,
    count_by_priority, count_by_status, count_priorities, date_in, days_until_due,
    most_recently_completed, most_recently_updated, overdue, upcoming_deadlines, utc_date,
    DailyCount, PriorityCounts, StatusCounts,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
