//! Flashcard review scheduling
//!
//! This module provides:
//! - Leitner box scheduling (box progression and review intervals)
//! - Review sessions (due selection, ordering, persisting outcomes)
//! - The card store contract with in-memory and JSON implementations

pub mod algorithm;
pub mod models;
pub mod session;
pub mod storage;

pub use algorithm::{advance, Demotion, LeitnerConfig, ReviewResult};
pub use models::*;
pub use session::{review_stats, select_due, suggest_topics, ReviewSession};
pub use storage::{CardStore, JsonCardStore, MemoryCardStore};
