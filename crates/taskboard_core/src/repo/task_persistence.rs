//! Task collection persistence adapter.
//!
//! # Responsibility
//! - Mirror the full task collection to one key of a `KeyValueStore`.
//! - Degrade gracefully: reads fall back to an empty collection, writes
//!   report warnings instead of failing the caller.
//!
//! # Invariants
//! - Every save is a full replace of the stored collection; there are no
//!   partial or incremental writes.
//! - A failed save leaves the previously stored bytes untouched.
//! - An absent record is not a warning; an unreadable or invalid one is.

use crate::config::CoreConfig;
use crate::model::task::{validate_collection, Task, TaskValidationError};
use crate::repo::kv::{KeyValueStore, StorageError};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of reading the stored collection.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Stored tasks in stored order; empty on any failure.
    pub tasks: Vec<Task>,
    pub warning: Option<DeserializationWarning>,
}

/// Why a stored record could not be turned into a task collection.
#[derive(Debug)]
pub enum DeserializationFailure {
    /// The medium failed to return the record.
    Unreadable(StorageError),
    /// Bytes are not a JSON array of well-formed tasks.
    Malformed(serde_json::Error),
    /// Tasks decoded but violate collection invariants.
    Invalid(TaskValidationError),
}

/// Stored record was present but unusable; the load fell back to empty.
#[derive(Debug)]
pub struct DeserializationWarning {
    pub key: String,
    pub failure: DeserializationFailure,
}

impl Display for DeserializationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.failure {
            DeserializationFailure::Unreadable(err) => {
                write!(f, "failed to read stored tasks `{}`: {err}", self.key)
            }
            DeserializationFailure::Malformed(err) => {
                write!(f, "stored tasks `{}` are malformed: {err}", self.key)
            }
            DeserializationFailure::Invalid(err) => {
                write!(f, "stored tasks `{}` are invalid: {err}", self.key)
            }
        }
    }
}

impl Error for DeserializationWarning {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.failure {
            DeserializationFailure::Unreadable(err) => Some(err),
            DeserializationFailure::Malformed(err) => Some(err),
            DeserializationFailure::Invalid(err) => Some(err),
        }
    }
}

/// Write-side operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOp {
    Save,
    Clear,
}

impl PersistenceOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Clear => "clear",
        }
    }
}

#[derive(Debug)]
pub enum PersistenceFailure {
    Encode(serde_json::Error),
    Storage(StorageError),
}

/// Stored state could not be updated; in-memory state is ahead of it.
#[derive(Debug)]
pub struct PersistenceWarning {
    pub key: String,
    pub op: PersistenceOp,
    pub failure: PersistenceFailure,
}

impl Display for PersistenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to {} stored tasks `{}`: ", self.op.as_str(), self.key)?;
        match &self.failure {
            PersistenceFailure::Encode(err) => write!(f, "{err}"),
            PersistenceFailure::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistenceWarning {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.failure {
            PersistenceFailure::Encode(err) => Some(err),
            PersistenceFailure::Storage(err) => Some(err),
        }
    }
}

/// Reads and writes the task collection under a fixed key.
pub struct TaskPersistence<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> TaskPersistence<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Uses `config.storage_key` as the record key.
    pub fn from_config(backend: S, config: &CoreConfig) -> Self {
        Self::new(backend, config.storage_key.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Reads the stored collection, falling back to empty on any failure.
    pub fn load(&self) -> LoadOutcome {
        let bytes = match self.backend.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(
                    "event=tasks_load module=persistence status=absent key={}",
                    self.key
                );
                return LoadOutcome {
                    tasks: Vec::new(),
                    warning: None,
                };
            }
            Err(err) => return self.load_failed(DeserializationFailure::Unreadable(err)),
        };

        let tasks: Vec<Task> = match serde_json::from_slice(&bytes) {
            Ok(tasks) => tasks,
            Err(err) => return self.load_failed(DeserializationFailure::Malformed(err)),
        };
        if let Err(err) = validate_collection(&tasks) {
            return self.load_failed(DeserializationFailure::Invalid(err));
        }

        debug!(
            "event=tasks_load module=persistence status=ok key={} count={} bytes={}",
            self.key,
            tasks.len(),
            bytes.len()
        );
        LoadOutcome {
            tasks,
            warning: None,
        }
    }

    /// Serializes and writes the full collection, replacing any prior value.
    pub fn save(&mut self, tasks: &[Task]) -> Result<(), PersistenceWarning> {
        let bytes = serde_json::to_vec(tasks)
            .map_err(|err| self.write_failed(PersistenceOp::Save, PersistenceFailure::Encode(err)))?;

        self.backend.put(&self.key, &bytes).map_err(|err| {
            self.write_failed(PersistenceOp::Save, PersistenceFailure::Storage(err))
        })?;

        debug!(
            "event=tasks_save module=persistence status=ok key={} count={} bytes={}",
            self.key,
            tasks.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Removes the stored record entirely.
    pub fn clear(&mut self) -> Result<(), PersistenceWarning> {
        self.backend.remove(&self.key).map_err(|err| {
            self.write_failed(PersistenceOp::Clear, PersistenceFailure::Storage(err))
        })?;

        debug!(
            "event=tasks_clear module=persistence status=ok key={}",
            self.key
        );
        Ok(())
    }

    fn load_failed(&self, failure: DeserializationFailure) -> LoadOutcome {
        let warning = DeserializationWarning {
            key: self.key.clone(),
            failure,
        };
        warn!(
            "event=tasks_load module=persistence status=fallback_empty key={} error={}",
            self.key, warning
        );
        LoadOutcome {
            tasks: Vec::new(),
            warning: Some(warning),
        }
    }

    fn write_failed(&self, op: PersistenceOp, failure: PersistenceFailure) -> PersistenceWarning {
        let warning = PersistenceWarning {
            key: self.key.clone(),
            op,
            failure,
        };
        warn!(
            "event=tasks_{} module=persistence status=error key={} error={}",
            op.as_str(),
            self.key,
            warning
        );
        warning
    }
}
