//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate mutations and persistence into the store API consumed by
//!   views.
//! - Keep views decoupled from storage details.

pub mod task_store;
