//! Statistics derived from task snapshots.
//!
//! # Responsibility
//! - Provide side-effect-free aggregations for dashboard views.
//! - Bundle the aggregations a dashboard page needs into one summary.

pub mod dashboard;
pub mod engine;
