//! Storage media and the task persistence adapter.
//!
//! # Responsibility
//! - Define the key-value byte store contract and its implementations.
//! - Mirror the task collection to that store as one full-replace record.
//!
//! # Invariants
//! - Storage failures surface as warnings at the adapter boundary; they
//!   never abort the caller.

pub mod kv;
pub mod sqlite_kv;
pub mod task_persistence;
