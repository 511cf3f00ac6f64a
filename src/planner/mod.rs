//! Study planner
//!
//! This module provides:
//! - Day-indexed planner tasks and their ordering
//! - The reconciliation engine keeping the local list in line with the task store
//! - The task store contract with in-memory and JSON implementations

pub mod engine;
pub mod models;
pub mod storage;

pub use engine::{PlannerConfig, PlannerEngine, ReconcileMode, SyncState, Transition};
pub use models::*;
pub use storage::{JsonTaskStore, MemoryTaskStore, TaskStore};
