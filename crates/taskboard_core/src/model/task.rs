//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record mirrored to persistent storage.
//! - Define the input shapes used to create (`TaskDraft`) and edit
//!   (`TaskPatch`) tasks.
//! - Validate record-level and collection-level invariants.
//!
//! # Invariants
//! - `id` is non-blank and unique within one collection.
//! - `name` is non-blank.
//! - `created_at <= updated_at`.
//!
//! # Wire format
//! Tasks serialize as camelCase JSON objects. The legacy field names
//! `Taskname` and `Duedate` are accepted on read and mapped to `name` and
//! `dueDate`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque stable identifier assigned by the store at creation time.
pub type TaskId = String;

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Task urgency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// All priorities in ascending urgency order.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTask")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub note: String,
    pub completed: bool,
    /// Set once at creation.
    pub created_at: Timestamp,
    /// Refreshed by every successful mutation of this task.
    pub updated_at: Timestamp,
}

impl Task {
    /// Validates record-level invariants.
    ///
    /// Does not check id uniqueness; see [`validate_collection`].
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(TaskValidationError::EmptyName);
        }
        if self.created_at > self.updated_at {
            return Err(TaskValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Returns whether the task is still open and its deadline lies before
    /// `as_of`.
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        !self.completed && self.due_date < as_of
    }

    /// Merges the mergeable fields of `patch` into this task.
    ///
    /// Does not touch `updated_at`; the store stamps it.
    pub(crate) fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Validates every record plus id uniqueness across the collection.
pub fn validate_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()?;
        if !seen.insert(task.id.as_str()) {
            return Err(TaskValidationError::DuplicateId(task.id.clone()));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    id: TaskId,
    #[serde(alias = "Taskname")]
    name: String,
    #[serde(alias = "Duedate")]
    due_date: NaiveDate,
    priority: Priority,
    #[serde(default)]
    note: String,
    #[serde(default)]
    completed: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TryFrom<RawTask> for Task {
    type Error = TaskValidationError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        let task = Task {
            id: raw.id,
            name: raw.name,
            due_date: raw.due_date,
            priority: raw.priority,
            note: raw.note,
            completed: raw.completed,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Input for creating a task.
///
/// Missing due date or priority is representable so that form submissions
/// can be handed over as-is; the store rejects them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDraft {
    #[serde(alias = "Taskname")]
    pub name: String,
    #[serde(alias = "Duedate")]
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub note: String,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, due_date: NaiveDate, priority: Priority) -> Self {
        Self {
            name: name.into(),
            due_date: Some(due_date),
            priority: Some(priority),
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Checks required fields and returns them normalized.
    pub(crate) fn validate(&self) -> Result<(String, NaiveDate, Priority), TaskValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(TaskValidationError::EmptyName);
        }
        let due_date = self.due_date.ok_or(TaskValidationError::MissingDueDate)?;
        let priority = self.priority.ok_or(TaskValidationError::MissingPriority)?;
        Ok((name.to_string(), due_date, priority))
    }
}

/// Partial update for an existing task.
///
/// `None` leaves the field unchanged. Identity and creation time are not
/// representable here; unknown fields in deserialized input are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPatch {
    #[serde(alias = "Taskname")]
    pub name: Option<String>,
    #[serde(alias = "Duedate")]
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub note: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub(crate) fn validate(&self) -> Result<(), TaskValidationError> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err(TaskValidationError::EmptyName),
            _ => Ok(()),
        }
    }
}

/// Task invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyId,
    EmptyName,
    MissingDueDate,
    MissingPriority,
    DuplicateId(TaskId),
    TimestampOrder {
        created_at: Timestamp,
        updated_at: Timestamp,
    },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "task id cannot be empty"),
            Self::EmptyName => write!(f, "task name cannot be empty"),
            Self::MissingDueDate => write!(f, "task due date is required"),
            Self::MissingPriority => write!(f, "task priority is required"),
            Self::DuplicateId(id) => write!(f, "duplicate task id `{id}`"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updatedAt ({updated_at}) must be >= createdAt ({created_at})"
            ),
        }
    }
}

impl Error for TaskValidationError {}
