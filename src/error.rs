//! Errors surfaced by the review session controller and the planner engine
//!
//! Store failures never escape as panics: they are caught at the component
//! boundary and reported as one of these variants, with the in-memory view
//! left unchanged or rolled back.

use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any store call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetch failed; the in-memory view was preserved
    #[error("Store read failed: {0}")]
    StoreRead(#[source] StoreError),

    /// Insert/update/delete failed; any optimistic change was rolled back
    #[error("Store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// Id absent from the current in-memory view
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
