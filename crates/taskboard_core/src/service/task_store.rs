//! Authoritative task collection.
//!
//! # Responsibility
//! - Own the ordered in-memory task collection for the whole session.
//! - Apply add/update/toggle/remove/clear/replace mutations.
//! - Mirror the collection to persistence after every successful mutation.
//!
//! # Invariants
//! - Task ids are unique and never reissued by this store instance, nor
//!   below any numeric id it loaded or was handed through `replace_all`.
//! - `created_at <= updated_at` for every task; `updated_at` never moves
//!   backwards even if the clock does.
//! - A persistence failure never rolls back the in-memory mutation; it is
//!   returned as a warning in `StoreOutcome`.
//! - Rejected mutations (validation, not found) change nothing and write
//!   nothing.

use crate::clock::Clock;
use crate::model::task::{
    validate_collection, Task, TaskDraft, TaskId, TaskPatch, TaskValidationError, Timestamp,
};
use crate::repo::kv::KeyValueStore;
use crate::repo::task_persistence::{DeserializationWarning, PersistenceWarning, TaskPersistence};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<StoreOutcome<T>, StoreError>;

/// Mutation rejected before it touched the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(TaskValidationError),
    NotFound(TaskId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Applied mutation plus the outcome of mirroring it to storage.
#[derive(Debug)]
pub struct StoreOutcome<T> {
    pub value: T,
    /// Set when the stored record could not be brought up to date.
    pub warning: Option<PersistenceWarning>,
}

impl<T> StoreOutcome<T> {
    fn new(value: T, warning: Option<PersistenceWarning>) -> Self {
        Self { value, warning }
    }

    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Single source of truth for tasks.
///
/// Mutations take `&mut self`; a host sharing the store across threads
/// wraps it in a mutex so that read-modify-write and the following save
/// stay one critical section.
pub struct TaskStore<S: KeyValueStore, C: Clock> {
    tasks: Vec<Task>,
    persistence: TaskPersistence<S>,
    clock: C,
    last_issued_id: i64,
    load_warning: Option<DeserializationWarning>,
}

impl<S: KeyValueStore, C: Clock> TaskStore<S, C> {
    /// Loads the stored collection and takes ownership of the adapter.
    ///
    /// Unreadable stored data yields an empty store; the warning stays
    /// available through [`TaskStore::load_warning`].
    pub fn open(persistence: TaskPersistence<S>, clock: C) -> Self {
        let outcome = persistence.load();
        info!(
            "event=store_open module=store status={} count={}",
            if outcome.warning.is_some() {
                "fallback_empty"
            } else {
                "ok"
            },
            outcome.tasks.len()
        );
        Self {
            last_issued_id: highest_numeric_id(&outcome.tasks),
            tasks: outcome.tasks,
            persistence,
            clock,
            load_warning: outcome.warning,
        }
    }

    /// Warning produced by the initial load, if any.
    pub fn load_warning(&self) -> Option<&DeserializationWarning> {
        self.load_warning.as_ref()
    }

    /// Current collection in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn persistence(&self) -> &TaskPersistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut TaskPersistence<S> {
        &mut self.persistence
    }

    /// Releases the adapter, e.g. to reopen a store over the same medium.
    pub fn into_persistence(self) -> TaskPersistence<S> {
        self.persistence
    }

    /// Creates a task from `draft` and appends it.
    ///
    /// # Errors
    /// - `StoreError::Validation` when name is blank or due date/priority
    ///   is missing.
    pub fn add(&mut self, draft: TaskDraft) -> StoreResult<Task> {
        let (name, due_date, priority) = draft.validate().map_err(|err| {
            debug!("event=task_add module=store status=rejected reason={err}");
            StoreError::Validation(err)
        })?;

        let now = self.clock.now_ms();
        let task = Task {
            id: self.next_id(now),
            name,
            due_date,
            priority,
            note: draft.note,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        self.tasks.push(task.clone());

        info!(
            "event=task_add module=store status=ok task_id={} count={}",
            task.id,
            self.tasks.len()
        );
        let warning = self.persist();
        Ok(StoreOutcome::new(task, warning))
    }

    /// Merges `patch` into the task with `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when no task has `id`.
    /// - `StoreError::Validation` when the patch sets a blank name.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> StoreResult<Task> {
        let index = self.position(id)?;
        patch.validate()?;

        let updated_at = self.stamp(self.tasks[index].updated_at);
        let task = &mut self.tasks[index];
        task.apply_patch(&patch);
        task.updated_at = updated_at;
        let task = task.clone();

        info!(
            "event=task_update module=store status=ok task_id={} completed={}",
            task.id, task.completed
        );
        let warning = self.persist();
        Ok(StoreOutcome::new(task, warning))
    }

    /// Flips the completion flag of the task with `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when no task has `id`.
    pub fn toggle_complete(&mut self, id: &str) -> StoreResult<Task> {
        let index = self.position(id)?;

        let updated_at = self.stamp(self.tasks[index].updated_at);
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        task.updated_at = updated_at;
        let task = task.clone();

        info!(
            "event=task_toggle module=store status=ok task_id={} completed={}",
            task.id, task.completed
        );
        let warning = self.persist();
        Ok(StoreOutcome::new(task, warning))
    }

    /// Removes the task with `id` and returns it.
    ///
    /// Unknown ids are a no-op: the value is `None` and nothing is written.
    pub fn remove(&mut self, id: &str) -> StoreOutcome<Option<Task>> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=task_remove module=store status=noop task_id={id}");
            return StoreOutcome::new(None, None);
        };

        let removed = self.tasks.remove(index);
        info!(
            "event=task_remove module=store status=ok task_id={} count={}",
            removed.id,
            self.tasks.len()
        );
        let warning = self.persist();
        StoreOutcome::new(Some(removed), warning)
    }

    /// Drops every task and deletes the stored record.
    ///
    /// Returns the number of tasks removed.
    pub fn clear(&mut self) -> StoreOutcome<usize> {
        let removed = self.tasks.len();
        self.tasks.clear();

        info!("event=store_clear module=store status=ok removed={removed}");
        let warning = self.persistence.clear().err();
        StoreOutcome::new(removed, warning)
    }

    /// Replaces the whole collection, e.g. for import or restore.
    ///
    /// Tasks are kept verbatim, including ids and timestamps.
    ///
    /// # Errors
    /// - `StoreError::Validation` when any task is invalid or ids repeat;
    ///   the current collection is left untouched.
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> StoreResult<usize> {
        validate_collection(&tasks).map_err(|err| {
            debug!("event=store_replace module=store status=rejected reason={err}");
            StoreError::Validation(err)
        })?;

        self.last_issued_id = self.last_issued_id.max(highest_numeric_id(&tasks));
        self.tasks = tasks;
        info!(
            "event=store_replace module=store status=ok count={}",
            self.tasks.len()
        );
        let warning = self.persist();
        Ok(StoreOutcome::new(self.tasks.len(), warning))
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| {
                debug!("event=task_lookup module=store status=not_found task_id={id}");
                StoreError::NotFound(id.to_string())
            })
    }

    fn stamp(&self, previous: Timestamp) -> Timestamp {
        self.clock.now_ms().max(previous)
    }

    /// Time-derived id, bumped past the high-water mark and past any id
    /// already present.
    fn next_id(&mut self, now: Timestamp) -> TaskId {
        let mut candidate = now.max(self.last_issued_id.saturating_add(1));
        loop {
            let id = candidate.to_string();
            if !self.tasks.iter().any(|task| task.id == id) {
                self.last_issued_id = candidate;
                return id;
            }
            candidate = candidate.saturating_add(1);
        }
    }

    fn persist(&mut self) -> Option<PersistenceWarning> {
        self.persistence.save(&self.tasks).err()
    }
}

/// Largest id in `tasks` that is a decimal integer, or 0.
fn highest_numeric_id(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .filter_map(|task| task.id.parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}
