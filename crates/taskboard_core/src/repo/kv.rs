//! Key-value byte store contract and in-memory implementation.
//!
//! # Responsibility
//! - Define the storage medium the task persistence adapter writes to.
//! - Provide a map-backed medium that can model full or disabled storage.
//!
//! # Invariants
//! - `put` replaces the whole value for a key or leaves it untouched.
//! - `remove` on an absent key succeeds.

use crate::db::DbError;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of the underlying storage medium.
#[derive(Debug)]
pub enum StorageError {
    /// Medium is disabled or otherwise not accepting operations.
    Unavailable(String),
    /// Write would exceed the configured capacity.
    QuotaExceeded { requested: usize, limit: usize },
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::QuotaExceeded { requested, limit } => write!(
                f,
                "storage quota exceeded: requested {requested} bytes, limit {limit} bytes"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistent key-value byte store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// Map-backed store.
///
/// The quota counts the bytes of all stored values after the write, which
/// mirrors how browser storage rejects writes once the origin budget is
/// spent.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, Vec<u8>>,
    quota_bytes: Option<usize>,
    read_only: bool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Rejects every write and remove while set.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::Unavailable("store is read-only".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.ensure_writable()?;

        if let Some(limit) = self.quota_bytes {
            let others: usize = self
                .entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(_, bytes)| bytes.len())
                .sum();
            let requested = others + value.len();
            if requested > limit {
                return Err(StorageError::QuotaExceeded { requested, limit });
            }
        }

        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.ensure_writable()?;
        self.entries.remove(key);
        Ok(())
    }
}
